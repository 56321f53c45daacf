mod category;
mod product;
mod user;

pub use category::{Category, NewCategory};
pub use product::{NewProduct, Product, UpdateProduct};
pub use user::{NewUser, UpdateUser, User};
