pub mod booking;
pub mod capability;
pub mod lifecycle;
pub mod postgrest;
pub mod slot;
pub mod store;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use postgrest::SupabaseRegistry;
pub use slot::SlotWindow;
