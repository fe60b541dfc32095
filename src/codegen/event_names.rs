//! LSL event name -> TSL handler method name translation.
//!
//! Every LSL event name lowers to `on` + PascalCase(name), e.g.
//! `state_entry` -> `onStateEntry`, `touch_start` -> `onTouchStart`. This
//! covers the full ~35-name vocabulary in [`crate::ast::EVENT_NAMES`]
//! uniformly, so no per-name exception table is needed.
pub fn tsl_handler_name(lsl_event: &str) -> String {
    let mut out = String::from("on");
    for segment in lsl_event.split('_') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_the_documented_examples() {
        assert_eq!(tsl_handler_name("state_entry"), "onStateEntry");
        assert_eq!(tsl_handler_name("state_exit"), "onStateExit");
        assert_eq!(tsl_handler_name("touch_start"), "onTouchStart");
        assert_eq!(tsl_handler_name("link_message"), "onLinkMessage");
        assert_eq!(tsl_handler_name("http_response"), "onHttpResponse");
    }
}
