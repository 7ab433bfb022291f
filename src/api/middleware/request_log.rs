use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
    time::Instant,
};
use tracing::{info, warn};

/// Logs method, path, status and latency of every request.
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLogMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let method = req.method().clone();
        let path = req.path().to_string();
        let started = Instant::now();

        Box::pin(async move {
            let result = srv.call(req).await;
            let elapsed_ms = started.elapsed().as_millis();

            match &result {
                Ok(res) => {
                    let status = res.status();
                    if status.is_server_error() {
                        warn!("{} {} -> {} in {}ms", method, path, status.as_u16(), elapsed_ms);
                    } else {
                        info!("{} {} -> {} in {}ms", method, path, status.as_u16(), elapsed_ms);
                    }
                }
                Err(e) => warn!("{} {} failed after {}ms: {}", method, path, elapsed_ms, e),
            }

            result
        })
    }
}
