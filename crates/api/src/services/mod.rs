//! Business services: registration workflow, ticket rendering, email.

pub mod email;
pub mod registration;
pub mod ticket;

pub use email::{EmailError, EmailMessage, EmailService};
pub use registration::RegistrationService;
pub use ticket::{TicketError, TicketService};
