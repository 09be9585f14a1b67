//! Entity models for the reservation engine

pub mod checkin;
pub mod device;
pub mod notification;
pub mod reservation;
pub mod user;

pub use checkin::{
    AdjustRequest, CheckIn, CheckInCreate, CheckInStatus, CheckoutRequest, CheckoutSummary,
    PaymentMethod, PaymentRequest, PaymentStatus,
};
pub use device::{Device, DeviceOperability, DeviceType};
pub use notification::NotificationEvent;
pub use reservation::{
    CancelRequest, NoShowRequest, RejectRequest, Reservation, ReservationCreate,
    ReservationStatus, ReservationUpdate,
};
pub use user::{User, UserRole};
