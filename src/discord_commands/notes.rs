use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use poise::serenity_prelude::{ButtonStyle, Color, MessageComponentInteraction};
use tracing::error;

use crate::{
    db::queries::notes::Note,
    discord_commands::forms::{
        browser_buttons, collect_form, parse_position, update_browser_message, FormField,
        BROWSER_NEXT, BROWSER_PREVIOUS,
    },
    pager::{parse_positions, BatchSummary, PageSource, Pager, PositionError, DEFAULT_PAGE_SIZE},
    AccessCheck, ApplicationContext, BotData, Context, Embed, Error,
};

const VIEW_TIMEOUT: Duration = Duration::from_secs(300);
const EDIT_TIMEOUT: Duration = Duration::from_secs(180);

const VIEW_NOTE: &str = "note.view";
const DELETE_NOTES: &str = "note.delete";
const EDIT_NOTE: &str = "note.edit";

const ACTIONS: &[(&str, &str, ButtonStyle)] = &[
    (VIEW_NOTE, "View Note", ButtonStyle::Success),
    (DELETE_NOTES, "Delete Notes", ButtonStyle::Danger),
];

struct NoteSource {
    data: BotData,
}

#[async_trait]
impl PageSource for NoteSource {
    type Item = Note;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<(Vec<Note>, usize), Error> {
        self.data.note_page(offset, limit).await.map_err(Into::into)
    }
}

#[derive(Debug, poise::Modal)]
#[name = "Create Note"]
struct NoteModal {
    #[name = "Title"]
    #[placeholder = "Enter note title"]
    #[max_length = 100]
    title: String,
    #[name = "Content"]
    #[placeholder = "Enter your note content"]
    #[paragraph]
    content: String,
}

#[poise::command(slash_command, category = "Notes")]
/// Save a private note
pub async fn note(ctx: ApplicationContext<'_>) -> Result<(), Error> {
    use poise::Modal as _;

    let pctx = poise::Context::Application(ctx);
    pctx.require_authorized().await?;

    let modal = match NoteModal::execute(ctx).await? {
        Some(modal) => modal,
        None => return Ok(()),
    };

    let (msg, err) = match ctx
        .data
        .add_note(modal.title, modal.content, pctx.created_at())
        .await
    {
        Ok(()) => ("Note saved successfully!".to_string(), false),
        Err(e) => (format!("Error saving note: {:?}", e), true),
    };

    Embed::default().description(msg).set_error(err).send(&pctx).await?;

    Ok(())
}

#[poise::command(slash_command, prefix_command, category = "Notes")]
/// View all saved notes
pub async fn viewnotes(ctx: Context<'_>) -> Result<(), Error> {
    ctx.require_authorized().await?;

    let data = ctx.data().clone();
    let mut pager = Pager::new(NoteSource { data: data.clone() }, DEFAULT_PAGE_SIZE);
    pager.load_page(0).await?;

    if pager.is_empty() {
        Embed::default().description("No notes found!").send(&ctx).await?;
        return Ok(());
    }

    let color = data.embed_color().await?;

    let reply = ctx
        .send(|b| {
            b.embed(|e| list_embed(&pager, color).create_embed(e))
                .components(|c| {
                    browser_buttons(c, pager.has_previous(), pager.has_next(), ACTIONS)
                })
                .ephemeral(true)
        })
        .await?;

    let message = reply.message().await?.into_owned();

    while let Some(interaction) = message
        .await_component_interaction(ctx)
        .author_id(ctx.author().id)
        .timeout(VIEW_TIMEOUT)
        .await
    {
        match interaction.data.custom_id.as_str() {
            BROWSER_PREVIOUS => {
                pager.previous().await?;
                update_browser_message(
                    &ctx,
                    &interaction,
                    list_embed(&pager, color),
                    pager.has_previous(),
                    pager.has_next(),
                    ACTIONS,
                )
                .await?;
            }
            BROWSER_NEXT => {
                pager.next().await?;
                update_browser_message(
                    &ctx,
                    &interaction,
                    list_embed(&pager, color),
                    pager.has_previous(),
                    pager.has_next(),
                    ACTIONS,
                )
                .await?;
            }
            VIEW_NOTE => {
                view_note(&ctx, &data, &pager, interaction.clone(), color).await?;

                // The edit flow may have changed the contents
                pager.load_page(pager.page_index()).await?;
                refresh(&ctx, &reply, &pager, color).await?;
            }
            DELETE_NOTES => {
                delete_notes(&ctx, &data, &mut pager, interaction.clone()).await?;

                pager.load_page(pager.page_index()).await?;
                refresh(&ctx, &reply, &pager, color).await?;
            }
            _ => {}
        }
    }

    // Session over, drop the buttons
    reply
        .edit(ctx, |b| {
            b.embed(|e| list_embed(&pager, color).create_embed(e))
                .components(|c| c)
        })
        .await
        .ok();

    Ok(())
}

fn list_embed(pager: &Pager<NoteSource>, color: Color) -> Embed {
    let render = pager.render(|position, note| {
        (
            format!("#{}. {}", position, note.title),
            format!("Created: {}", note.created_display()),
        )
    });

    let mut embed = Embed::default()
        .color(color)
        .title("Your Notes")
        .description("Select a note number to view its contents")
        .footer(render.footer);
    for (name, value) in render.fields {
        embed = embed.field(name, value, false);
    }
    embed
}

async fn refresh<'a>(
    ctx: &Context<'a>,
    reply: &poise::ReplyHandle<'a>,
    pager: &Pager<NoteSource>,
    color: Color,
) -> Result<(), Error> {
    reply
        .edit(*ctx, |b| {
            b.embed(|e| list_embed(pager, color).create_embed(e))
                .components(|c| browser_buttons(c, pager.has_previous(), pager.has_next(), ACTIONS))
        })
        .await?;

    Ok(())
}

async fn resolve_note(
    pager: &Pager<NoteSource>,
    position: usize,
) -> Result<Option<Note>, Error> {
    match pager.item_at(position).cloned() {
        Some(note) => Ok(Some(note)),
        None => pager.fetch_item(position).await,
    }
}

async fn view_note(
    ctx: &Context<'_>,
    data: &BotData,
    pager: &Pager<NoteSource>,
    interaction: Arc<MessageComponentInteraction>,
    color: Color,
) -> Result<(), Error> {
    let fields = [FormField::short("Note Number")
        .placeholder(format!("Enter a number between 1 and {}", pager.total_count()))];

    let values = match collect_form(ctx, interaction, "View Note", &fields, EDIT_TIMEOUT).await? {
        Some(values) => values,
        None => return Ok(()),
    };

    let position = match parse_position(&values[0], pager.total_count()) {
        Ok(position) => position,
        Err(PositionError::Invalid) => {
            Embed::error().description("Please enter a valid number!").send(ctx).await?;
            return Ok(());
        }
        Err(PositionError::NotFound(_)) => {
            Embed::error().description("Invalid note number!").send(ctx).await?;
            return Ok(());
        }
    };

    let note = match resolve_note(pager, position).await? {
        Some(note) => note,
        None => {
            Embed::error().description("Invalid note number!").send(ctx).await?;
            return Ok(());
        }
    };

    let reply = ctx
        .send(|b| {
            b.embed(|e| {
                Embed::default()
                    .color(color)
                    .title(&note.title)
                    .description(&note.content)
                    .footer(format!("Created: {}", note.created_display()))
                    .create_embed(e)
            })
            .components(|c| {
                c.create_action_row(|r| {
                    r.create_button(|b| {
                        b.custom_id(EDIT_NOTE).label("Edit").style(ButtonStyle::Primary)
                    })
                })
            })
            .ephemeral(true)
        })
        .await?;

    let note_message = reply.message().await?.into_owned();
    if let Some(edit_interaction) = note_message
        .await_component_interaction(ctx)
        .author_id(ctx.author().id)
        .timeout(EDIT_TIMEOUT)
        .await
    {
        let fields = [FormField::paragraph("Content").prefill(&note.content)];
        if let Some(values) =
            collect_form(ctx, edit_interaction, "Edit Note", &fields, EDIT_TIMEOUT).await?
        {
            let (msg, err) = match data.update_note(note.id, values[0].clone()).await {
                Ok(true) => ("Note updated!".to_string(), false),
                Ok(false) => ("Note no longer exists.".to_string(), true),
                Err(e) => (format!("Error updating note: {:?}", e), true),
            };

            Embed::default().description(msg).set_error(err).send(ctx).await?;
        }
    }

    reply.edit(*ctx, |b| b.components(|c| c)).await.ok();

    Ok(())
}

async fn delete_notes(
    ctx: &Context<'_>,
    data: &BotData,
    pager: &mut Pager<NoteSource>,
    interaction: Arc<MessageComponentInteraction>,
) -> Result<(), Error> {
    let fields = [FormField::short("Note Numbers")
        .placeholder("Enter numbers separated by commas (e.g., 1,3,6)")];

    let values = match collect_form(ctx, interaction, "Delete Notes", &fields, EDIT_TIMEOUT).await?
    {
        Some(values) => values,
        None => return Ok(()),
    };

    let positions = match parse_positions(&values[0]) {
        Ok(positions) => positions,
        Err(_) => {
            Embed::error()
                .description("Invalid input. Please enter numbers separated by commas (e.g., 1,3,6).")
                .send(ctx)
                .await?;
            return Ok(());
        }
    };

    // Resolve every position against the pre-delete snapshot first so earlier
    // deletions can't shift later targets
    let mut summary = BatchSummary::default();
    let mut targets = Vec::new();
    for position in positions {
        if pager.validate_position(position).is_err() {
            summary.failed(position);
            continue;
        }
        match resolve_note(pager, position).await? {
            Some(note) => targets.push((position, note.id)),
            None => summary.failed(position),
        }
    }

    for (position, note_id) in targets {
        match data.delete_note(note_id).await {
            Ok(true) => summary.succeeded(),
            Ok(false) => summary.failed(position),
            Err(e) => {
                error!("Error deleting note at position {}: {:?}", position, e);
                summary.failed(position);
            }
        }
    }

    Embed::default()
        .description(summary.describe("note"))
        .set_error(summary.deleted == 0)
        .send(ctx)
        .await?;

    Ok(())
}
