pub mod health;
pub mod openid;
