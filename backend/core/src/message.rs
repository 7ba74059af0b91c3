use serde::{Deserialize, Serialize};

/// An inbound image event handed from a channel adapter to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEvent {
    /// Platform message id; also the stem of every staged file.
    pub message_id: String,
    pub reply_token: Option<String>,
    pub user_id: Option<String>,
}

/// Card with a hero image (clickable) and a text body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexCard {
    pub hero_image_url: String,
    pub hero_link_url: String,
    pub body_text: String,
}

impl FlexCard {
    /// Card whose hero both shows and links to `image_url`.
    pub fn with_hero(image_url: impl Into<String>, body_text: impl Into<String>) -> Self {
        let url = image_url.into();
        Self {
            hero_image_url: url.clone(),
            hero_link_url: url,
            body_text: body_text.into(),
        }
    }
}

/// A message produced by the pipeline. Constructed, sent once, dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Image { url: String },
    Flex(FlexCard),
}

/// How one outbound message reaches the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Answer with the event's single-use reply token.
    Reply { token: String },
    /// Push to a user id.
    Push { to: String },
}

impl ImageEvent {
    /// Delivery for the `index`-th emission of this event. The reply token is
    /// consumed by the first emission; later ones push to the sender.
    pub fn delivery_for(&self, index: usize) -> Option<Delivery> {
        match (&self.reply_token, &self.user_id) {
            (Some(token), _) if index == 0 => Some(Delivery::Reply { token: token.clone() }),
            (_, Some(user)) => Some(Delivery::Push { to: user.clone() }),
            (Some(token), None) => Some(Delivery::Reply { token: token.clone() }),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(token: Option<&str>, user: Option<&str>) -> ImageEvent {
        ImageEvent {
            message_id: "100".into(),
            reply_token: token.map(String::from),
            user_id: user.map(String::from),
        }
    }

    #[test]
    fn first_emission_replies_then_pushes() {
        let ev = event(Some("tok"), Some("U1"));
        assert_eq!(ev.delivery_for(0), Some(Delivery::Reply { token: "tok".into() }));
        assert_eq!(ev.delivery_for(1), Some(Delivery::Push { to: "U1".into() }));
        assert_eq!(ev.delivery_for(2), Some(Delivery::Push { to: "U1".into() }));
    }

    #[test]
    fn falls_back_to_reply_without_user() {
        let ev = event(Some("tok"), None);
        assert_eq!(ev.delivery_for(2), Some(Delivery::Reply { token: "tok".into() }));
    }

    #[test]
    fn no_route_without_token_or_user() {
        assert_eq!(event(None, None).delivery_for(0), None);
    }

    #[test]
    fn flex_hero_links_to_itself() {
        let card = FlexCard::with_hero("https://i.example/a.jpg", "body");
        assert_eq!(card.hero_image_url, card.hero_link_url);
    }
}
