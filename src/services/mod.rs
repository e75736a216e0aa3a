pub mod csv_loader;
pub mod dataset_service;
pub mod incident_service;
pub mod maintenance;
pub mod ticket_service;
pub mod user_service;

pub use csv_loader::{load_all, load_table, replace_table_from_csv, CsvRow, LoadError};
pub use dataset_service::DatasetService;
pub use incident_service::IncidentService;
pub use maintenance::{clear_record_tables, ClearReport};
pub use ticket_service::TicketService;
pub use user_service::{BootstrapReport, UserService};
