use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::Error;

pub const IMGFLIP_CAPTION_URL: &str = "https://api.imgflip.com/caption_image";

/// How many template choices a /meme invocation offers
pub const MEME_CHOICE_COUNT: usize = 4;

#[derive(Debug)]
pub struct MemeTemplate {
    pub name: &'static str,
    pub id: &'static str,
    pub labels: &'static [&'static str],
    pub preview: &'static str,
    pub description: &'static str,
}

impl MemeTemplate {
    pub fn parts(&self) -> usize {
        self.labels.len()
    }
}

pub const MEME_TEMPLATES: &[MemeTemplate] = &[
    MemeTemplate {
        name: "Drake",
        id: "181913649",
        labels: &["Top", "Bottom"],
        preview: "https://i.imgflip.com/30b1gx.jpg",
        description: "Drake preferring one thing over another",
    },
    MemeTemplate {
        name: "Woman Yelling at Cat",
        id: "188390779",
        labels: &["Woman", "Cat"],
        preview: "https://i.imgflip.com/2puag9.jpg",
        description: "Woman yelling at confused cat",
    },
    MemeTemplate {
        name: "Distracted Boyfriend",
        id: "112126428",
        labels: &["Other Girl", "Boyfriend", "Girlfriend"],
        preview: "https://i.imgflip.com/1ur9b0.jpg",
        description: "Guy looking back at another girl",
    },
    MemeTemplate {
        name: "Two Buttons",
        id: "87743020",
        labels: &["Left Button", "Right Button"],
        preview: "https://i.imgflip.com/1g8my4.jpg",
        description: "Sweating guy choosing buttons",
    },
    MemeTemplate {
        name: "Expanding Brain",
        id: "93895088",
        labels: &["Small Brain", "Normal", "Expanding", "Cosmic"],
        preview: "https://i.imgflip.com/1jwhww.jpg",
        description: "Brain expansion stages",
    },
    MemeTemplate {
        name: "Gru's Plan",
        id: "131940431",
        labels: &["Step 1", "Step 2", "Step 3", "Realization"],
        preview: "https://i.imgflip.com/26jxvz.jpg",
        description: "Plan backfiring",
    },
    MemeTemplate {
        name: "One Does Not Simply",
        id: "61579",
        labels: &["Top", "Bottom"],
        preview: "https://i.imgflip.com/1bij.jpg",
        description: "Boromir's warning",
    },
    MemeTemplate {
        name: "Change My Mind",
        id: "129242436",
        labels: &["Opinion"],
        preview: "https://i.imgflip.com/24y43o.jpg",
        description: "Change my mind",
    },
    MemeTemplate {
        name: "Surprised Pikachu",
        id: "155067746",
        labels: &["Caption"],
        preview: "https://i.imgflip.com/2kbn1e.jpg",
        description: "Shocked Pikachu",
    },
    MemeTemplate {
        name: "Panik Kalm Panik",
        id: "226297822",
        labels: &["Panik", "Kalm", "Panik"],
        preview: "https://i.imgflip.com/3qqcim.png",
        description: "Panic stages",
    },
    MemeTemplate {
        name: "This Is Fine",
        id: "55311130",
        labels: &["Top", "Bottom"],
        preview: "https://i.imgflip.com/wxica.jpg",
        description: "Dog in burning room",
    },
    MemeTemplate {
        name: "Batman Slapping Robin",
        id: "438680",
        labels: &["Robin", "Batman"],
        preview: "https://i.imgflip.com/9ehk.jpg",
        description: "Batman slap",
    },
    MemeTemplate {
        name: "Disaster Girl",
        id: "97984",
        labels: &["Top", "Bottom"],
        preview: "https://i.imgflip.com/23ls.jpg",
        description: "Girl smiling at fire",
    },
    MemeTemplate {
        name: "Hide the Pain Harold",
        id: "27813981",
        labels: &["Top", "Bottom"],
        preview: "https://i.imgflip.com/gk5el.jpg",
        description: "Harold hiding pain",
    },
    MemeTemplate {
        name: "Evil Kermit",
        id: "84341851",
        labels: &["Me", "Evil Me"],
        preview: "https://i.imgflip.com/1e7ql7.jpg",
        description: "Dark side Kermit",
    },
];

/// A random selection of templates to offer
pub fn random_templates(count: usize) -> Vec<&'static MemeTemplate> {
    MEME_TEMPLATES
        .choose_multiple(&mut rand::thread_rng(), count.min(MEME_TEMPLATES.len()))
        .collect()
}

pub fn template_by_id(id: &str) -> Option<&'static MemeTemplate> {
    MEME_TEMPLATES.iter().find(|template| template.id == id)
}

#[derive(Debug, Deserialize)]
pub struct CaptionResponse {
    pub success: bool,
    pub data: Option<CaptionData>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptionData {
    pub url: String,
}

/// Posts the captions to imgflip and returns the rendered image URL
pub async fn caption_image(
    client: &reqwest::Client,
    username: &str,
    password: &str,
    template: &MemeTemplate,
    captions: &[String],
) -> Result<String, Error> {
    let mut form = vec![
        ("template_id".to_string(), template.id.to_string()),
        ("username".to_string(), username.to_string()),
        ("password".to_string(), password.to_string()),
    ];
    for (i, caption) in captions.iter().enumerate() {
        form.push((format!("boxes[{}][text]", i), caption.clone()));
    }

    let response: CaptionResponse = client
        .post(IMGFLIP_CAPTION_URL)
        .form(&form)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    match response {
        CaptionResponse { success: true, data: Some(data), .. } => Ok(data.url),
        CaptionResponse { error_message, .. } => Err(anyhow::anyhow!(
            "imgflip rejected the caption request: {}",
            error_message.unwrap_or_else(|| "no error message".to_string())
        ))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_fits_in_a_discord_modal() {
        for template in MEME_TEMPLATES {
            assert!(
                (1..=5).contains(&template.parts()),
                "{} has {} caption boxes",
                template.name,
                template.parts()
            );
            assert!(template.preview.starts_with("https://"));
        }
    }

    #[test]
    fn template_ids_are_unique() {
        for (i, a) in MEME_TEMPLATES.iter().enumerate() {
            for b in MEME_TEMPLATES.iter().skip(i + 1) {
                assert_ne!(a.id, b.id, "{} and {} share an id", a.name, b.name);
            }
        }
    }

    #[test]
    fn random_selection_returns_distinct_templates() {
        let templates = random_templates(MEME_CHOICE_COUNT);
        assert_eq!(templates.len(), MEME_CHOICE_COUNT);

        for (i, a) in templates.iter().enumerate() {
            for b in templates.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn caption_responses_parse_both_outcomes() {
        let ok: CaptionResponse = serde_json::from_str(
            r#"{"success": true, "data": {"url": "https://i.imgflip.com/abc.jpg", "page_url": "https://imgflip.com/i/abc"}}"#,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.data.unwrap().url, "https://i.imgflip.com/abc.jpg");

        let err: CaptionResponse = serde_json::from_str(
            r#"{"success": false, "error_message": "Invalid username/password"}"#,
        )
        .unwrap();
        assert!(!err.success);
        assert_eq!(err.error_message.as_deref(), Some("Invalid username/password"));
    }
}
