/*!
 * Modem handle.
 *
 * A [`Modem`] owns the driver session for one serial-attached powerline
 * controller. It reads the all-link database on demand and is the entry point
 * for connecting devices (see the `connection` module).
 */
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn, Instrument};

use powerline_core::logging::{component_span, operation_span, Span};

use crate::database::LinkDatabase;
use crate::driver::{ModemSession, PowerlineDriver, TransportError};
use crate::error::{PowerlineError, Result};

/// Most recent transport error, shared by a modem and the devices it connected
#[derive(Debug, Clone, Default)]
pub(crate) struct LastError(Arc<RwLock<Option<TransportError>>>);

impl LastError {
    pub(crate) fn get(&self) -> Option<TransportError> {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn record(&self, error: &TransportError) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error.clone());
    }
}

/// Handle to one powerline modem
///
/// A modem must be driven by one logical owner at a time: the underlying
/// transport is single-session and requests are not serialized here. Callers
/// that share a modem across tasks must provide their own exclusion.
pub struct Modem {
    port: String,
    driver_name: &'static str,
    session: Box<dyn ModemSession>,
    last_error: LastError,
    span: Span,
}

impl fmt::Debug for Modem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modem")
            .field("port", &self.port)
            .field("driver", &self.driver_name)
            .field("last_error", &self.last_error())
            .finish()
    }
}

impl Modem {
    /// Open the modem on `port` through `driver`
    pub async fn open(driver: &dyn PowerlineDriver, port: &str) -> Result<Self> {
        if port.trim().is_empty() {
            return Err(PowerlineError::invalid_argument("modem port must not be empty"));
        }

        let span = component_span("modem", Some(port));
        async {
            debug!("Opening modem on {}", port);
            match driver.open(port).await {
                Ok(session) => {
                    info!("Opened modem on {} with driver {}", port, driver.name());
                    Ok(Self {
                        port: port.to_string(),
                        driver_name: driver.name(),
                        session,
                        last_error: LastError::default(),
                        span: span.clone(),
                    })
                }
                Err(source) => {
                    warn!("Failed to open modem on {}: {}", port, source);
                    Err(PowerlineError::ModemCommunication {
                        port: port.to_string(),
                        source,
                    })
                }
            }
        }
        .instrument(operation_span("open", driver.name()))
        .instrument(span.clone())
        .await
    }

    /// Transport identifier
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Name of the driver the modem was opened with
    pub fn driver_name(&self) -> &'static str {
        self.driver_name
    }

    /// The most recent error the driver reported on this modem
    ///
    /// Covers database reads, connection attempts and commands sent through
    /// any device connected from this modem. Informational only; every
    /// failing call also returns its error.
    pub fn last_error(&self) -> Option<TransportError> {
        self.last_error.get()
    }

    pub(crate) fn record_error(&self, error: &TransportError) {
        self.last_error.record(error);
    }

    pub(crate) fn error_slot(&self) -> LastError {
        self.last_error.clone()
    }

    /// Span that every operation on this modem runs under
    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn session(&self) -> &dyn ModemSession {
        self.session.as_ref()
    }

    /// Read the all-link database
    ///
    /// Every call queries the modem; nothing is cached.
    pub async fn link_database(&self) -> Result<LinkDatabase> {
        let span = operation_span("read_link_database", &self.port);
        async {
            match self.session.read_link_database().await {
                Ok(records) => {
                    debug!("Read {} link records from {}", records.len(), self.port);
                    Ok(LinkDatabase::new(self.port.clone(), records))
                }
                Err(source) => {
                    warn!("Failed to read link database from {}: {}", self.port, source);
                    self.record_error(&source);
                    Err(PowerlineError::ModemCommunication {
                        port: self.port.clone(),
                        source,
                    })
                }
            }
        }
        .instrument(span)
        .instrument(self.span.clone())
        .await
    }
}
