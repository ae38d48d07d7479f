//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Transitions hold a lease and may sleep for a while, so they always
//! await (never block), and the caller only waits for them up to the request timeout. See [`with_request_timeout`].
use std::{future::Future, time::Duration};

use actix_web::{error::JsonPayloadError, get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use order_lifecycle_engine::{
    db_types::{NewOrder, OrderId, OrderStatusType},
    lease::LeaseStore,
    OrderFlowApi,
    OrderFlowError,
    OrderManagement,
    ShippingWebhookApi,
};

use crate::{
    config::ServerOptions,
    data_objects::{CancelOrderRequest, HealthResponse, HistoryResponse, PayOrderRequest, TransitionResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// JSON extractor configuration that reports bad request bodies with the same `{"error": ...}` shape as every other
/// error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

/// Waits at most `timeout` for a transition.
///
/// The engine runs every transition on its own task, so when the timeout fires the caller gets a 504 while the
/// transition carries on to completion (including the lease release) in the background. Nothing is rolled back.
pub async fn with_request_timeout<T, F>(timeout: Duration, transition: F) -> Result<T, ServerError>
where F: Future<Output = Result<T, OrderFlowError>> {
    match tokio::time::timeout(timeout, transition).await {
        Ok(result) => result.map_err(ServerError::from),
        Err(_) => {
            warn!("💻️ Transition did not finish within {timeout:?}. It will complete in the background.");
            Err(ServerError::RequestTimeout(timeout))
        },
    }
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(HealthResponse::default())
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement, LeaseStore);
/// Stores a new order in `PENDING_PAYMENT` and replies with 201 and the full order, including its generated id and
/// total.
pub async fn create_order<B, L>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B, L>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    L: LeaseStore,
{
    let order = body.into_inner();
    debug!("💻️ POST new order for customer {} ({} items)", order.customer_id, order.items.len());
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement, LeaseStore);
pub async fn order_by_id<B, L>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, L>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    L: LeaseStore,
{
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ GET order {order_id}");
    let order = api.fetch_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{order_id}/history" impl OrderManagement, LeaseStore);
/// The status history of an order, most recent first. Unknown orders have an empty history rather than a 404.
pub async fn order_history<B, L>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, L>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    L: LeaseStore,
{
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ GET history for order {order_id}");
    let history = api.fetch_history(&order_id).await?;
    Ok(HttpResponse::Ok().json(HistoryResponse { order_id, history }))
}

//----------------------------------------------   Transitions  ------------------------------------------------
route!(pay_order => Post "/orders/{order_id}/pay" impl OrderManagement, LeaseStore);
/// Marks an order as paid. The body carries the payment id: `{"payment_id": "..."}`.
pub async fn pay_order<B, L>(
    path: web::Path<String>,
    body: web::Json<PayOrderRequest>,
    api: web::Data<OrderFlowApi<B, L>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + 'static,
    L: LeaseStore + 'static,
{
    let order_id = OrderId::from(path.into_inner());
    let payment_id = body.into_inner().payment_id;
    debug!("💻️ POST pay order {order_id} (payment_id={payment_id})");
    let id = order_id.clone();
    with_request_timeout(options.request_timeout, async move { api.pay_order(&id, &payment_id).await }).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, OrderStatusType::Paid, "payment accepted")))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl OrderManagement, LeaseStore);
/// Cancels an unpaid order. The body is optional. If given, it may carry a reason: `{"reason": "..."}`.
pub async fn cancel_order<B, L>(
    path: web::Path<String>,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, L>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + 'static,
    L: LeaseStore + 'static,
{
    let order_id = OrderId::from(path.into_inner());
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CancelOrderRequest::default()
    } else {
        serde_json::from_slice::<CancelOrderRequest>(&body).map_err(|e| {
            debug!("💻️ Could not deserialize cancel request for order {order_id}. {e}");
            ServerError::InvalidRequestBody(e.to_string())
        })?
    };
    debug!("💻️ POST cancel order {order_id}");
    let id = order_id.clone();
    let reason = request.reason;
    with_request_timeout(options.request_timeout, async move { api.cancel_order(&id, reason.as_deref()).await })
        .await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, OrderStatusType::Cancelled, "order cancelled")))
}

route!(ship_order => Post "/orders/{order_id}/ship" impl OrderManagement, LeaseStore);
pub async fn ship_order<B, L>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, L>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + 'static,
    L: LeaseStore + 'static,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ POST ship order {order_id}");
    let id = order_id.clone();
    with_request_timeout(options.request_timeout, async move { api.ship_order(&id).await }).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::new(order_id, OrderStatusType::Shipping, "shipping initiated")))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(shipping_webhook => Post "/shipping" impl OrderManagement);
/// Route handler for the shipping carrier webhook.
///
/// This route must be mounted behind [`crate::middleware::WebhookSignatureFactory`], which rejects unsigned and
/// badly signed requests before they get here. The body is then parsed and dispatched. See
/// [`ShippingWebhookApi::process_event`] for the checks that are made and the order in which they run.
///
/// Dispatcher writes do not take the order's lease.
pub async fn shipping_webhook<B: OrderManagement>(
    body: web::Bytes,
    api: web::Data<ShippingWebhookApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received shipping webhook ({} bytes)", body.len());
    let response = api.process_payload(body.as_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}
