pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::BookingStatus;
pub use error::CoreError;
pub use structs::{
    Booking, BookingFilter, BookingPatch, Cancellation, CancellationFilter, CancellationPatch,
    Flight, FlightFilter, FlightPatch, NewBooking, NewCancellation, NewFlight, NewPassenger,
    Passenger, PassengerFilter, PassengerPatch,
};
