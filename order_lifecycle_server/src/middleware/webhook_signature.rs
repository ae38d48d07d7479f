//! Webhook signature middleware for Actix Web.
//!
//! Shipping carriers sign each webhook with the shared secret and send the hex HMAC-SHA256 digest in a header
//! (`X-Webhook-Signature` by default). This middleware reads the body, checks the signature with the configured
//! [`SignatureMode`] and only then lets the request through to the handler, with the body restored.
//!
//! Missing and invalid signatures are answered with 401 and a JSON error body. The handler never runs.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use order_lifecycle_engine::{
    webhook::{SignatureMode, WebhookVerifier},
    WebhookError,
};

use crate::errors::ServerError;

pub struct WebhookSignatureFactory {
    signature_header: String,
    verifier: WebhookVerifier,
    mode: SignatureMode,
}

impl WebhookSignatureFactory {
    pub fn new(signature_header: &str, verifier: WebhookVerifier, mode: SignatureMode) -> Self {
        WebhookSignatureFactory { signature_header: signature_header.into(), verifier, mode }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = WebhookSignatureService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureService {
            signature_header: self.signature_header.clone(),
            verifier: self.verifier.clone(),
            mode: self.mode,
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookSignatureService<S> {
    signature_header: String,
    verifier: WebhookVerifier,
    mode: SignatureMode,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let signature_header = self.signature_header.clone();
        let mode = self.mode;
        Box::pin(async move {
            trace!("🪝️ Checking {mode} webhook signature for request");
            let data = match req.extract::<web::Bytes>().await {
                Ok(data) => data,
                Err(e) => {
                    warn!("🪝️ Failed to read webhook body: {e}");
                    let err = ServerError::InvalidRequestBody("failed to read body".into());
                    return Ok(req.error_response(err).map_into_right_body());
                },
            };
            let signature = req
                .headers()
                .get(signature_header.as_str())
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            match verifier.verify(mode, data.as_ref(), &signature) {
                Ok(()) => {
                    trace!("🪝️ Webhook signature ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => {
                    warn!("🪝️ Rejected webhook ({mode} signature). {e}");
                    let err = ServerError::from(WebhookError::from(e));
                    Ok(req.error_response(err).map_into_right_body())
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
