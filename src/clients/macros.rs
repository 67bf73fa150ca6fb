/// Generates a private request method on a client that owns a `sender` and a
/// `request_timeout`. The method builds the request variant, sends it and
/// waits for the service's reply. A closed, dropped or silent service is a
/// failed transaction from the caller's point of view.
macro_rules! request_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, LedgerError> {
                let (respond_to, response) = oneshot::channel();
                self.sender
                    .send($request::$variant {
                        $($param,)*
                        respond_to,
                    })
                    .await
                    .map_err(|_| {
                        error!("Service closed");
                        LedgerError::TransactionFailed
                    })?;

                match tokio::time::timeout(self.request_timeout, response).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => {
                        error!("Service dropped the request");
                        Err(LedgerError::TransactionFailed)
                    }
                    Err(_) => {
                        warn!(timeout = ?self.request_timeout, "No reply from service");
                        Err(LedgerError::TransactionFailed)
                    }
                }
            }
        }
    };
}
