use super::message::Message;
use crate::wide::Int64;
use crate::{category, shape};

shape! {
    pub struct ChatTypePrivate = "chatTypePrivate" {
        user_id: Int64,
    }
}

shape! {
    pub struct ChatTypeBasicGroup = "chatTypeBasicGroup" {
        basic_group_id: Int64,
    }
}

shape! {
    pub struct ChatTypeSupergroup = "chatTypeSupergroup" {
        supergroup_id: Int64,
        is_channel: bool,
    }
}

shape! {
    pub struct ChatTypeSecret = "chatTypeSecret" {
        secret_chat_id: i32,
        user_id: Int64,
    }
}

category! {
    pub enum ChatType = "ChatType" {
        Private(ChatTypePrivate),
        BasicGroup(ChatTypeBasicGroup),
        Supergroup(ChatTypeSupergroup),
        Secret(ChatTypeSecret),
    }
}

shape! {
    pub struct Chat = "chat" {
        id: Int64,
        title: String,
        unread_count: i32,
        last_message: Option<Message>,
    }
    variants {
        kind as "type": ChatType,
    }
}

shape! {
    pub struct Chats = "chats" {
        total_count: i32,
        chat_ids: Vec<Int64>,
    }
}
