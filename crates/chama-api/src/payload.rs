use serde::Deserialize;

/// Responses come either wrapped as `{ "data": ... }` or bare
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(inner) => inner,
        }
    }
}

/// A list, or a page object holding the list under `key`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MessagePage<T> {
    List(Vec<T>),
    Paged { messages: Vec<T> },
}

impl<T> MessagePage<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) | Self::Paged { messages: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConversationPage<T> {
    List(Vec<T>),
    Paged { conversations: Vec<T> },
}

impl<T> ConversationPage<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) | Self::Paged { conversations: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UnreadCount {
    Number(u32),
    Object {
        #[serde(alias = "unreadCount")]
        count: u32,
    },
}

impl UnreadCount {
    pub(crate) fn value(&self) -> u32 {
        match self {
            Self::Number(n) | Self::Object { count: n } => *n,
        }
    }
}
