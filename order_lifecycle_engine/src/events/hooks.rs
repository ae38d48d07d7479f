use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, RefundRequestedEvent, StatusChangedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub status_changed_producer: Vec<EventProducer<StatusChangedEvent>>,
    pub refund_requested_producer: Vec<EventProducer<RefundRequestedEvent>>,
}

impl EventProducers {
    pub async fn publish_status_changed(&self, event: StatusChangedEvent) {
        for emitter in &self.status_changed_producer {
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_refund_requested(&self, event: RefundRequestedEvent) {
        for emitter in &self.refund_requested_producer {
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_status_changed: Option<EventHandler<StatusChangedEvent>>,
    pub on_refund_requested: Option<EventHandler<RefundRequestedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_refund_requested = hooks.on_refund_requested.map(|f| EventHandler::new(buffer_size, f));
        Self { on_status_changed, on_refund_requested }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_refund_requested {
            result.refund_requested_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_refund_requested {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_status_changed: Option<Handler<StatusChangedEvent>>,
    pub on_refund_requested: Option<Handler<RefundRequestedEvent>>,
}

impl EventHooks {
    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_refund_requested<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RefundRequestedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_refund_requested = Some(Arc::new(f));
        self
    }
}
