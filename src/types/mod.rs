mod wire;

pub use wire::{
    BotMessagePayload, OutboundMessage, ReceiveMessagePayload, ReplyStatus, SendReceipt,
    ServerEvent, StatusResponse, StreamTokenPayload,
};
