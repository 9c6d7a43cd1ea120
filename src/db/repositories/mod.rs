mod appointment_repository;
mod availability_repository;
mod directory_repository;
mod notification_repository;

pub use appointment_repository::AppointmentRepository;
pub use availability_repository::AvailabilityRepository;
pub use directory_repository::DirectoryRepository;
pub use notification_repository::NotificationRepository;
