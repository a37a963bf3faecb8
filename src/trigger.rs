use lazy_regex::{regex, Captures};

/// Substituted for {server} when the message didn't come from a guild
pub const DM_SERVER_NAME: &str = "DM";

/// Guild id used for triggers created (and matched) outside of a guild
pub const DM_SCOPE: u64 = 0;

/// A stored auto-responder rule
///
/// A name starting with `@` is a mention trigger, anything else matches on
/// the message text. Matching is case-insensitive on both sides
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub id: i64,
    pub guild_id: u64,
    pub name: String,
    pub response: String,
}

/// Everything needed to resolve the placeholders in a trigger response
pub struct ResponseContext<'a> {
    pub user_mention: &'a str,
    pub channel_mention: &'a str,
    pub server_name: Option<&'a str>,
}

/// Finds the first trigger that matches the message
///
/// `normalized_message` must already have mentions resolved to display names
/// and be lower-cased. `mentioned_names` are the display names from the
/// platform's structured mention list. At most one trigger fires; iteration
/// order is the order triggers come back from the repository
pub fn find_match<'a>(
    triggers: &'a [Trigger],
    normalized_message: &str,
    mentioned_names: &[String],
) -> Option<&'a Trigger> {
    triggers.iter().find(|trigger| {
        let name = trigger.name.to_lowercase();
        if let Some(target) = name.strip_prefix('@') {
            mention_matches(target, normalized_message, mentioned_names)
        } else {
            text_matches(&name, normalized_message)
        }
    })
}

// Exact, whitespace-delimited word and substring checks, any of them is
// enough. The word and exact checks are redundant with the substring check
// for plain text but are kept to match the documented behaviour
fn text_matches(name: &str, message: &str) -> bool {
    name == message
        || message.split_whitespace().any(|word| word == name)
        || message.contains(name)
}

fn mention_matches(target: &str, message: &str, mentioned_names: &[String]) -> bool {
    mentioned_names
        .iter()
        .any(|name| name.to_lowercase().contains(target))
        || message.contains(target)
}

/// Builds the response for a matched trigger by substituting the
/// {user}/{channel}/{server} placeholders
pub fn render_response(template: &str, ctx: &ResponseContext) -> String {
    regex!(r"\{(user|channel|server)\}")
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "user" => ctx.user_mention.to_string(),
            "channel" => ctx.channel_mention.to_string(),
            "server" => ctx.server_name.unwrap_or(DM_SERVER_NAME).to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(id: i64, name: &str, response: &str) -> Trigger {
        Trigger {
            id,
            guild_id: DM_SCOPE,
            name: name.to_string(),
            response: response.to_string(),
        }
    }

    #[test]
    fn text_trigger_matches_exact_word_and_substring() {
        let triggers = vec![trigger(1, "hi", "r")];

        for message in ["hi", "well hi there", "hiya"] {
            assert!(
                find_match(&triggers, message, &[]).is_some(),
                "expected {:?} to match",
                message
            );
        }

        assert!(find_match(&triggers, "hello", &[]).is_none());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let triggers = vec![trigger(1, "HI", "r")];
        assert!(find_match(&triggers, "oh hi mark", &[]).is_some());
    }

    #[test]
    fn mention_trigger_matches_structured_mentions_and_plain_text() {
        let triggers = vec![trigger(1, "@bob", "r")];

        // Structured mention even though the text carries the raw id form
        assert!(find_match(&triggers, "hey <@12345>", &["Bob".to_string()]).is_some());

        // Plain text that merely contains the name, no real mention
        assert!(find_match(&triggers, "i saw bob yesterday", &[]).is_some());

        assert!(find_match(&triggers, "nothing relevant", &[]).is_none());
    }

    #[test]
    fn first_match_wins() {
        let triggers = vec![trigger(1, "cat", "r1"), trigger(2, "cat dog", "r2")];

        let matched = find_match(&triggers, "cat dog", &[]).unwrap();
        assert_eq!(matched.response, "r1");
    }

    #[test]
    fn response_placeholders_are_substituted() {
        let ctx = ResponseContext {
            user_mention: "<@1>",
            channel_mention: "<#2>",
            server_name: Some("My Server"),
        };

        assert_eq!(
            render_response("Hello {user} in {channel} on {server}", &ctx),
            "Hello <@1> in <#2> on My Server"
        );
    }

    #[test]
    fn dm_substitutes_the_server_sentinel() {
        let ctx = ResponseContext {
            user_mention: "<@1>",
            channel_mention: "<#2>",
            server_name: None,
        };

        assert_eq!(render_response("on {server}", &ctx), format!("on {}", DM_SERVER_NAME));
    }
}
