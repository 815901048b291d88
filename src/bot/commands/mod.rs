pub mod attendance;
pub mod currency;
pub mod utility;

use crate::bot::{Data, Error};

/// Every slash command the bot exposes, registered once at startup.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        attendance::register(),
        attendance::attend(),
        attendance::record(),
        currency::balance(),
        currency::transactions(),
        currency::addjam(),
        utility::user(),
        utility::server(),
    ]
}
