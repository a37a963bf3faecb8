use std::{sync::Arc, time::Duration};

use poise::serenity_prelude::{
    ActionRowComponent, ButtonStyle, CollectModalInteraction, CreateComponents, InputTextStyle,
    InteractionResponseType, MessageComponentInteraction,
};

use crate::{ensure, pager::PositionError, Context, Embed, Error};

pub(crate) const BROWSER_PREVIOUS: &str = "browser.previous";
pub(crate) const BROWSER_NEXT: &str = "browser.next";

/// One labelled input of a dynamically built form
pub(crate) struct FormField {
    pub label: String,
    pub style: InputTextStyle,
    pub placeholder: Option<String>,
    pub prefill: Option<String>,
}

impl FormField {
    pub fn short<T: ToString>(label: T) -> Self {
        Self {
            label: label.to_string(),
            style: InputTextStyle::Short,
            placeholder: None,
            prefill: None,
        }
    }

    pub fn paragraph<T: ToString>(label: T) -> Self {
        Self {
            label: label.to_string(),
            style: InputTextStyle::Paragraph,
            placeholder: None,
            prefill: None,
        }
    }

    pub fn placeholder<T: ToString>(mut self, placeholder: T) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn prefill<T: ToString>(mut self, prefill: T) -> Self {
        self.prefill = Some(prefill.to_string());
        self
    }
}

/// Opens a modal with one input per field in response to a component
/// interaction and waits for the values, keyed by field position
///
/// Returns None when the user dismisses the modal or the timeout elapses
pub(crate) async fn collect_form(
    ctx: &Context<'_>,
    interaction: Arc<MessageComponentInteraction>,
    title: &str,
    fields: &[FormField],
    timeout: Duration,
) -> Result<Option<Vec<String>>, Error> {
    // A Discord modal holds at most 5 inputs
    ensure!(!fields.is_empty() && fields.len() <= 5, "forms need 1 to 5 fields");

    let serenity_ctx = ctx.serenity_context();
    let modal_id = interaction.id.0.to_string();

    interaction
        .create_interaction_response(serenity_ctx, |b| {
            b.kind(InteractionResponseType::Modal)
                .interaction_response_data(|d| {
                    d.custom_id(&modal_id).title(title).components(|c| {
                        for (index, field) in fields.iter().enumerate() {
                            c.create_action_row(|r| {
                                r.create_input_text(|t| {
                                    t.custom_id(index.to_string())
                                        .label(&field.label)
                                        .style(field.style)
                                        .required(true);
                                    if let Some(placeholder) = field.placeholder.as_ref() {
                                        t.placeholder(placeholder);
                                    }
                                    if let Some(prefill) = field.prefill.as_ref() {
                                        t.value(prefill);
                                    }
                                    t
                                })
                            });
                        }
                        c
                    })
                })
        })
        .await?;

    let filter_id = modal_id.clone();
    let response = CollectModalInteraction::new(&serenity_ctx.shard)
        .author_id(interaction.user.id)
        .filter(move |submission| submission.data.custom_id == filter_id)
        .timeout(timeout)
        .await;

    let response = match response {
        Some(response) => response,
        None => return Ok(None),
    };

    // Acknowledge the submission, the caller edits or follows up afterwards
    response
        .create_interaction_response(serenity_ctx, |b| {
            b.kind(InteractionResponseType::DeferredUpdateMessage)
        })
        .await?;

    let mut values = vec![String::new(); fields.len()];
    for row in response.data.components.iter() {
        for component in row.components.iter() {
            if let ActionRowComponent::InputText(input) = component {
                if let Ok(index) = input.custom_id.parse::<usize>() {
                    if index < values.len() {
                        values[index] = input.value.clone();
                    }
                }
            }
        }
    }

    Ok(Some(values))
}

/// Previous/Next plus the view's own action buttons, derived from the pager
/// state on every render
pub(crate) fn browser_buttons<'a>(
    c: &'a mut CreateComponents,
    has_previous: bool,
    has_next: bool,
    actions: &[(&str, &str, ButtonStyle)],
) -> &'a mut CreateComponents {
    c.create_action_row(|r| {
        r.create_button(|b| {
            b.custom_id(BROWSER_PREVIOUS)
                .label("Previous")
                .style(ButtonStyle::Secondary)
                .disabled(!has_previous)
        });
        r.create_button(|b| {
            b.custom_id(BROWSER_NEXT)
                .label("Next")
                .style(ButtonStyle::Secondary)
                .disabled(!has_next)
        });
        for (custom_id, label, style) in actions {
            r.create_button(|b| b.custom_id(custom_id).label(label).style(*style));
        }
        r
    })
}

/// Re-renders the browser message in response to a navigation click
pub(crate) async fn update_browser_message(
    ctx: &Context<'_>,
    interaction: &MessageComponentInteraction,
    embed: Embed,
    has_previous: bool,
    has_next: bool,
    actions: &[(&str, &str, ButtonStyle)],
) -> Result<(), Error> {
    interaction
        .create_interaction_response(ctx.serenity_context(), |b| {
            b.kind(InteractionResponseType::UpdateMessage)
                .interaction_response_data(|d| {
                    d.embed(|e| embed.create_embed(e))
                        .components(|c| browser_buttons(c, has_previous, has_next, actions))
                })
        })
        .await?;

    Ok(())
}

/// Parses a single 1-based position against the collection's current total
pub(crate) fn parse_position(input: &str, total_count: usize) -> Result<usize, PositionError> {
    let position = input
        .trim()
        .parse::<usize>()
        .map_err(|_| PositionError::Invalid)?;

    if position >= 1 && position <= total_count {
        Ok(position)
    } else {
        Err(PositionError::NotFound(position))
    }
}
