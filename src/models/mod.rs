pub mod activities;
pub mod activity_participants;
pub mod participation;
pub mod users;

pub use activities::ActivitiesRow;
pub use activity_participants::ActivityParticipantsRow;
pub use participation::ParticipationRow;
pub use users::{CurrentUserRow, UsersRow};
