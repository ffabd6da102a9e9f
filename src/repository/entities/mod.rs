pub mod membership;
pub mod room;
pub mod user_profile;

pub mod prelude {
    pub use super::membership::Entity as Membership;
    pub use super::room::Entity as Room;
    pub use super::user_profile::Entity as UserProfile;
}
