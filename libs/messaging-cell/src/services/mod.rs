pub mod flagging;
pub mod messages;

pub use flagging::detect_contact_sharing;
pub use messages::MessageService;
