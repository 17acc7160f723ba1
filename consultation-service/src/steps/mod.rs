// Consultation wizard steps, in flow order
pub mod intake;
pub mod suggestion;
pub mod order_info;
pub mod cart_sync;
pub mod invoice;
pub mod feedback;

// Re-export step implementations
pub use cart_sync::CartSyncStep;
pub use feedback::FeedbackStep;
pub use intake::IntakeStep;
pub use invoice::InvoiceStep;
pub use order_info::OrderInfoStep;
pub use suggestion::SuggestionStep;
