pub mod activity_service;
pub mod otp_service;
pub mod participation_service;
