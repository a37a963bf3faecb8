use std::sync::Arc;

use poise::{ChoiceParameter, ReplyHandle, serenity_prelude::{self as serenity, CreateEmbed, Http, Message}};
use random_color::RandomColor;
use serenity::Color;

use crate::{
    ChannelId, Context, BOT_COLOR_ERROR, BOT_COLOR_NORMAL, BOT_COLOR_SUCCESS,
};

#[derive(Clone, Copy, ChoiceParameter, PartialEq)]
pub enum EmbedFlavour {
    Normal,
    Error,
    Success,
}

impl Into<Color> for EmbedFlavour {
    fn into(self) -> Color {
        match self {
            EmbedFlavour::Normal => BOT_COLOR_NORMAL,
            EmbedFlavour::Error => BOT_COLOR_ERROR,
            EmbedFlavour::Success => BOT_COLOR_SUCCESS,
        }
        .into()
    }
}

#[derive(Default)]
pub struct Embed {
    pub color: Option<Color>,
    pub flavour: Option<EmbedFlavour>,
    pub thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
    pub ephemeral: Option<bool>,
}

impl Embed {
    pub fn error() -> Self {
        Self {
            flavour: Some(EmbedFlavour::Error),
            title: Some("Error".to_string()),
            ..Default::default()
        }
    }
    pub fn success() -> Self {
        Self {
            flavour: Some(EmbedFlavour::Success),
            ..Default::default()
        }
    }
    pub fn color<T: Into<Color>>(mut self, color: T) -> Self {
        self.color = Some(color.into());
        self
    }
    pub fn random_color(mut self) -> Self {
        let [r, g, b] = RandomColor::new().to_rgb_array();
        self.color = Some(Color::from_rgb(r as u8, g as u8, b as u8));
        self
    }
    pub fn flavour(mut self, flavour: EmbedFlavour) -> Self {
        self.flavour = Some(flavour);
        self
    }
    pub fn set_error(mut self, is_error: bool) -> Self {
        if is_error {
            self.flavour = Some(EmbedFlavour::Error);
        } else if self.flavour == Some(EmbedFlavour::Error) {
            self.flavour = None;
        }
        self
    }
    pub fn thumbnail_url<T: ToString>(mut self, thumbnail_url: T) -> Self {
        self.thumbnail_url = Some(thumbnail_url.to_string());
        self
    }
    pub fn image_url<T: ToString>(mut self, image_url: T) -> Self {
        self.image_url = Some(image_url.to_string());
        self
    }
    pub fn title<T: ToString>(mut self, title: T) -> Self {
        self.title = Some(title.to_string());
        self
    }
    pub fn description<T: ToString>(mut self, description: T) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn field<N: ToString, V: ToString>(mut self, name: N, value: V, inline: bool) -> Self {
        self.fields.push((name.to_string(), value.to_string(), inline));
        self
    }
    pub fn footer<T: ToString>(mut self, footer: T) -> Self {
        self.footer = Some(footer.to_string());
        self
    }
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }
    pub async fn send<'a>(self, ctx: &Context<'a>) -> Result<ReplyHandle<'a>, serenity::Error> {
        let ephemeral = self.ephemeral.unwrap_or(true);

        ctx.send(|b| b
            .embed(|b| self.create_embed(b))
            .ephemeral(ephemeral)
        )
        .await
    }
    pub async fn send_in_channel<'a>(
        self,
        channel_id: ChannelId,
        http: &'a Arc<Http>,
    ) -> Result<Message, serenity::Error> {
        channel_id
            .send_message(http, |b| b.embed(|b| self.create_embed(b)))
            .await
    }
    pub fn create_embed<'a>(self, mut b: &mut CreateEmbed) -> &mut CreateEmbed {
        let Self {
            color,
            flavour,
            thumbnail_url,
            image_url,
            title,
            description,
            fields,
            footer,
            ..
        } = self;

        let flavour = flavour.unwrap_or(EmbedFlavour::Normal);
        let color = color.unwrap_or(flavour.into());

        b = b.color(color);

        if let Some(thumbnail_url) = thumbnail_url {
            b = b.thumbnail(thumbnail_url);
        }
        if let Some(image_url) = image_url {
            b = b.image(image_url);
        }
        if let Some(title) = title {
            b = b.title(title);
        }
        if let Some(description) = description {
            b = b.description(description);
        }
        for (name, value, inline) in fields {
            b = b.field(name, value, inline);
        }
        if let Some(footer) = footer {
            b = b.footer(|b| b.text(footer));
        }

        b
    }
}
