use super::call::Call;
use super::chat::Chat;
use super::connection::ConnectionState;
use super::example::Tick;
use super::message::{Message, MessageContent};
use crate::wide::Int64;
use crate::{category, shape};

shape! {
    pub struct UpdateNewMessage = "updateNewMessage" {
        message: Message,
    }
}

shape! {
    pub struct UpdateMessageContent = "updateMessageContent" {
        chat_id: Int64,
        message_id: Int64,
    }
    variants {
        new_content: MessageContent,
    }
}

shape! {
    pub struct UpdateNewChat = "updateNewChat" {
        chat: Chat,
    }
}

shape! {
    pub struct UpdateChatTitle = "updateChatTitle" {
        chat_id: Int64,
        title: String,
    }
}

shape! {
    pub struct UpdateCall = "updateCall" {
        call: Call,
    }
}

shape! {
    pub struct UpdateConnectionState = "updateConnectionState" {}
    variants {
        state: ConnectionState,
    }
}

category! {
    /// Push events: every document the engine sends without a correlation
    /// token.
    pub enum Update = "Update" {
        Tick(Tick),
        NewMessage(UpdateNewMessage),
        MessageContent(UpdateMessageContent),
        NewChat(UpdateNewChat),
        ChatTitle(UpdateChatTitle),
        Call(UpdateCall),
        ConnectionState(UpdateConnectionState),
    }
}
