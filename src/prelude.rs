pub use crate::config::{PerfConfiguration, PerfDefault, PerfDefaultType};
pub use crate::events::{RunEvent, RunEventSender};
pub use crate::export::{PerfDelivery, PerfExport};
pub use crate::naming::{ItemNode, ItemPath, ResolveName};
pub use crate::timing::CorrelationToken;
pub use crate::{PerfReporter, PerfReporterError, ReporterPhase};
