use poise::{self, Command};

use crate::{BotData, Error};

pub(crate) mod forms;

mod access;
use access::*;
mod memes;
use memes::*;
mod minecraft;
use minecraft::*;
mod notes;
use notes::*;
mod settings;
use settings::*;
mod triggers;
use triggers::*;
mod utils;
use utils::*;
mod valorant;
use valorant::*;

pub fn commands() -> Vec<Command<BotData, Error>> {
    vec![
        help(),
        hello(),
        status(),
        roll(),
        coinflip(),
        eightball(),
        note(),
        viewnotes(),
        triggercreate(),
        triggerlist(),
        settings(),
        get_config(),
        set_config(),
        delete_config(),
        blacklist(),
        unblacklist(),
        unauthusers(),
        mcstatus(),
        valoinfo(),
        meme(),
    ]
}
