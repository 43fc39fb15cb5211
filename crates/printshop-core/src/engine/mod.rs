//! Order engine that owns the shared services.
//!
//! The [`OrderEngine`] is what the service binary and the HTTP API hold on
//! to: it hands out draft stores, submits them, and answers history lookups.
//! Its [`run`](OrderEngine::run) loop reports order events until shutdown.

pub mod event_bus;

use crate::draft::DraftStore;
use crate::history::OrderHistory;
use crate::id_generator::IdGenerator;
use crate::submission::SubmissionEngine;
use event_bus::EventBus;
use printshop_config::Config;
use printshop_pricing::DeliveryPricing;
use printshop_remote::RemoteService;
use printshop_storage::StorageService;
use printshop_types::{HistoryEvent, OrderEvent, SubmissionEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
}

#[derive(Clone)]
pub struct OrderEngine {
	config: Config,
	pricing: DeliveryPricing,
	storage: Arc<StorageService>,
	remote: Option<Arc<RemoteService>>,
	history: Arc<OrderHistory>,
	ids: Arc<IdGenerator>,
	submission: Arc<SubmissionEngine>,
	event_bus: EventBus,
}

impl OrderEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		remote: Option<Arc<RemoteService>>,
		event_bus: EventBus,
	) -> Self {
		let scope = config.service.id.clone();
		let pricing = DeliveryPricing {
			base_fee: config.pricing.delivery_base_fee,
			included_miles: config.pricing.delivery_included_miles,
			per_mile: config.pricing.delivery_per_mile,
		};
		let history = Arc::new(OrderHistory::new(
			storage.clone(),
			scope.clone(),
			event_bus.clone(),
		));
		let ids = Arc::new(IdGenerator::new(
			storage.clone(),
			scope,
			config.orders.id_prefix.clone(),
			config.orders.include_year,
		));
		let submission = Arc::new(SubmissionEngine::new(
			history.clone(),
			ids.clone(),
			remote.clone(),
			event_bus.clone(),
		));

		Self {
			config,
			pricing,
			storage,
			remote,
			history,
			ids,
			submission,
			event_bus,
		}
	}

	/// A fresh, empty draft using this engine's pricing and file limit.
	pub fn new_draft(&self, id: impl Into<String>) -> DraftStore {
		DraftStore::new(id, self.pricing, self.config.orders.max_files)
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn pricing(&self) -> &DeliveryPricing {
		&self.pricing
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn remote_enabled(&self) -> bool {
		self.remote.is_some()
	}

	pub fn history(&self) -> &Arc<OrderHistory> {
		&self.history
	}

	pub fn id_generator(&self) -> &Arc<IdGenerator> {
		&self.ids
	}

	pub fn submission(&self) -> &Arc<SubmissionEngine> {
		&self.submission
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Logs order events until ctrl-c is received.
	pub async fn run(&self) -> Result<(), EngineError> {
		let mut events = self.event_bus.subscribe();
		tracing::info!(
			service = %self.config.service.id,
			remote = self.remote_enabled(),
			"Order engine running"
		);

		loop {
			tokio::select! {
				event = events.recv() => match event {
					Ok(event) => log_event(&event),
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Event listener lagged");
					},
					Err(RecvError::Closed) => break,
				},
				signal = tokio::signal::ctrl_c() => {
					signal.map_err(|e| EngineError::Service(format!("Failed to listen for shutdown: {}", e)))?;
					tracing::info!("Shutdown signal received");
					break;
				}
			}
		}

		Ok(())
	}
}

fn log_event(event: &OrderEvent) {
	match event {
		OrderEvent::Submission(SubmissionEvent::Completed {
			order_id, flow, total, ..
		}) => {
			tracing::info!(order_id = %order_id, flow = %flow, total, "Order recorded");
		},
		OrderEvent::Submission(SubmissionEvent::RemoteConfirmed {
			document_id,
			uploaded_files,
			..
		}) => {
			tracing::debug!(document_id = %document_id, uploaded_files, "Remote order confirmed");
		},
		OrderEvent::Submission(SubmissionEvent::RemoteDegraded { reason, .. }) => {
			tracing::debug!(reason = %reason, "Remote order sync degraded");
		},
		OrderEvent::Submission(SubmissionEvent::Rejected { reason, .. }) => {
			tracing::debug!(reason = %reason, "Submission rejected");
		},
		OrderEvent::History(HistoryEvent::StatusChanged { order_id, from, to }) => {
			tracing::debug!(order_id = %order_id, from = %from, to = %to, "Order status changed");
		},
		OrderEvent::History(HistoryEvent::Cleared) => {
			tracing::debug!("Order history cleared");
		},
	}
}
