pub mod developer;
pub mod manager;
pub mod parcel;
pub mod parcel_developer;

pub use developer::Entity as Developer;
pub use manager::Entity as Manager;
pub use parcel::Entity as Parcel;
pub use parcel_developer::Entity as ParcelDeveloper;
