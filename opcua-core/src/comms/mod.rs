pub mod chunker;
pub mod message_chunk;
pub mod secure_channel;
pub mod security_header;
pub mod send_buffer;
pub mod tcp_codec;
pub mod url;
