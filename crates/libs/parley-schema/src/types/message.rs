use super::common::FormattedText;
use crate::wide::Int64;
use crate::{category, shape};

shape! {
    pub struct MessageSenderUser = "messageSenderUser" {
        user_id: Int64,
    }
}

shape! {
    /// A message posted on behalf of a chat, e.g. a channel post.
    pub struct MessageSenderChat = "messageSenderChat" {
        chat_id: Int64,
    }
}

category! {
    pub enum MessageSender = "MessageSender" {
        User(MessageSenderUser),
        Chat(MessageSenderChat),
    }
}

shape! {
    pub struct MessageSenders = "messageSenders" {
        total_count: i32,
    }
    variants {
        senders: Vec<MessageSender>,
    }
}

shape! {
    pub struct Location = "location" {
        latitude: f64,
        longitude: f64,
        horizontal_accuracy: f64,
    }
}

shape! {
    pub struct MessageText = "messageText" {
        text: FormattedText,
    }
}

shape! {
    pub struct MessagePhoto = "messagePhoto" {
        caption: FormattedText,
        has_spoiler: bool,
    }
}

shape! {
    pub struct MessageSticker = "messageSticker" {
        emoji: String,
        is_premium: bool,
    }
}

shape! {
    pub struct MessageLocation = "messageLocation" {
        location: Location,
        live_period: i32,
    }
}

shape! {
    /// Content this client does not know how to render.
    pub struct MessageUnsupported = "messageUnsupported" {}
}

category! {
    pub enum MessageContent = "MessageContent" {
        Text(MessageText),
        Photo(MessagePhoto),
        Sticker(MessageSticker),
        Location(MessageLocation),
        Unsupported(MessageUnsupported),
    }
}

shape! {
    pub struct Message = "message" {
        id: Int64,
        chat_id: Int64,
        date: i32,
        is_outgoing: bool,
        reply_to_message_id: Option<Int64>,
    }
    variants {
        sender_id: MessageSender,
        forward_sender_id: Option<MessageSender>,
        content: MessageContent,
    }
}

shape! {
    pub struct Messages = "messages" {
        total_count: i32,
        messages: Vec<Message>,
    }
}
