use std::fmt;

use crate::{category, shape};

shape! {
    /// Reply carried by the reserved `error` discriminant.
    pub struct EngineError = "error" {
        code: i32,
        message: String,
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine error {}: {}", self.code, self.message)
    }
}

shape! {
    /// Empty success reply.
    pub struct Done = "ok" {}
}

shape! {
    pub struct TextEntityTypeBold = "textEntityTypeBold" {}
}

shape! {
    pub struct TextEntityTypeItalic = "textEntityTypeItalic" {}
}

shape! {
    pub struct TextEntityTypeUrl = "textEntityTypeUrl" {}
}

shape! {
    pub struct TextEntityTypeMention = "textEntityTypeMention" {}
}

shape! {
    /// A link whose target differs from the visible text.
    pub struct TextEntityTypeTextUrl = "textEntityTypeTextUrl" {
        url: String,
    }
}

category! {
    pub enum TextEntityType = "TextEntityType" {
        Bold(TextEntityTypeBold),
        Italic(TextEntityTypeItalic),
        Url(TextEntityTypeUrl),
        Mention(TextEntityTypeMention),
        TextUrl(TextEntityTypeTextUrl),
    }
}

shape! {
    /// Markup over `length` UTF-16 code units starting at `offset`.
    pub struct TextEntity = "textEntity" {
        offset: i32,
        length: i32,
    }
    variants {
        kind as "type": TextEntityType,
    }
}

shape! {
    pub struct FormattedText = "formattedText" {
        text: String,
        entities: Vec<TextEntity>,
    }
}
