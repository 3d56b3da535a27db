//! Receiver-side dispatch table keyed by message kind.

use crate::bridge::message::{BridgeMessage, LogLevel, MessageKind};
use crate::model::app::AppId;
use std::collections::BTreeMap;

/// Live window facts a handler may need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext<'a> {
    pub instance: &'a AppId,
    /// Desktop position of the window's top-left corner.
    pub window_origin: (i32, i32),
    pub title_bar_height: i32,
}

/// Host-facing outcome of one dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ConsoleLine {
        instance: AppId,
        level: LogLevel,
        text: String,
    },
    /// Context menu to show at desktop coordinates.
    ShowContextMenu { instance: AppId, x: i32, y: i32 },
}

pub type BridgeHandler =
    Box<dyn FnMut(&DispatchContext<'_>, &BridgeMessage) -> Option<HostEvent>>;

pub struct BridgeRouter {
    handlers: BTreeMap<MessageKind, BridgeHandler>,
}

impl Default for BridgeRouter {
    fn default() -> Self {
        Self::with_default_handlers()
    }
}

impl BridgeRouter {
    /// Router with no handlers; every message is ignored.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Router wired with console and context-menu handling.
    pub fn with_default_handlers() -> Self {
        let mut router = Self::empty();
        router.register(MessageKind::Log, Box::new(console_line));
        router.register(MessageKind::RuntimeError, Box::new(runtime_error_line));
        router.register(
            MessageKind::ContextMenuRequest,
            Box::new(context_menu_at_desktop),
        );
        router
    }

    /// Installs `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: MessageKind, handler: BridgeHandler) {
        self.handlers.insert(kind, handler);
    }

    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn dispatch(
        &mut self,
        context: &DispatchContext<'_>,
        message: &BridgeMessage,
    ) -> Option<HostEvent> {
        let handler = self.handlers.get_mut(&message.kind())?;
        handler(context, message)
    }
}

fn console_line(context: &DispatchContext<'_>, message: &BridgeMessage) -> Option<HostEvent> {
    let BridgeMessage::Log { level, text } = message else {
        return None;
    };
    Some(HostEvent::ConsoleLine {
        instance: context.instance.clone(),
        level: *level,
        text: text.clone(),
    })
}

fn runtime_error_line(
    context: &DispatchContext<'_>,
    message: &BridgeMessage,
) -> Option<HostEvent> {
    let BridgeMessage::RuntimeError { message, line } = message else {
        return None;
    };
    let text = match line {
        Some(line) => format!("{message} (Line {line})"),
        None => message.clone(),
    };
    Some(HostEvent::ConsoleLine {
        instance: context.instance.clone(),
        level: LogLevel::Error,
        text,
    })
}

fn context_menu_at_desktop(
    context: &DispatchContext<'_>,
    message: &BridgeMessage,
) -> Option<HostEvent> {
    let BridgeMessage::ContextMenuRequest { x, y } = message else {
        return None;
    };
    let (origin_x, origin_y) = context.window_origin;
    Some(HostEvent::ShowContextMenu {
        instance: context.instance.clone(),
        x: origin_x + x,
        y: origin_y + y + context.title_bar_height,
    })
}

#[cfg(test)]
mod tests {
    use super::{BridgeRouter, DispatchContext, HostEvent};
    use crate::bridge::message::{BridgeMessage, LogLevel, MessageKind};
    use crate::model::app::AppId;

    fn context(instance: &AppId) -> DispatchContext<'_> {
        DispatchContext {
            instance,
            window_origin: (100, 50),
            title_bar_height: 36,
        }
    }

    #[test]
    fn translates_context_menu_to_desktop_coordinates() {
        let id = AppId::new("a");
        let mut router = BridgeRouter::with_default_handlers();
        let event = router.dispatch(
            &context(&id),
            &BridgeMessage::ContextMenuRequest { x: 10, y: 5 },
        );
        assert_eq!(
            event,
            Some(HostEvent::ShowContextMenu {
                instance: id.clone(),
                x: 110,
                y: 91
            })
        );
    }

    #[test]
    fn runtime_errors_become_error_console_lines() {
        let id = AppId::new("a");
        let mut router = BridgeRouter::default();
        let event = router.dispatch(
            &context(&id),
            &BridgeMessage::RuntimeError {
                message: "boom".to_string(),
                line: Some(7),
            },
        );
        assert_eq!(
            event,
            Some(HostEvent::ConsoleLine {
                instance: id.clone(),
                level: LogLevel::Error,
                text: "boom (Line 7)".to_string()
            })
        );
    }

    #[test]
    fn custom_handler_replaces_default_and_missing_kind_is_ignored() {
        let id = AppId::new("a");
        let mut router = BridgeRouter::empty();
        assert!(router
            .dispatch(
                &context(&id),
                &BridgeMessage::Log {
                    level: LogLevel::Info,
                    text: "x".to_string()
                }
            )
            .is_none());

        router.register(
            MessageKind::Log,
            Box::new(|ctx: &DispatchContext<'_>, _: &BridgeMessage| {
                Some(HostEvent::ConsoleLine {
                    instance: ctx.instance.clone(),
                    level: LogLevel::Warn,
                    text: "custom".to_string(),
                })
            }),
        );
        assert!(router.has_handler(MessageKind::Log));
        assert!(!router.has_handler(MessageKind::ContextMenuRequest));

        let event = router.dispatch(
            &context(&id),
            &BridgeMessage::Log {
                level: LogLevel::Info,
                text: "x".to_string(),
            },
        );
        assert!(matches!(
            event,
            Some(HostEvent::ConsoleLine { ref text, .. }) if text == "custom"
        ));
    }
}
