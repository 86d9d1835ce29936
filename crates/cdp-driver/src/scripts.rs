//! Page-world script builders.
//!
//! Every DOM interaction is one self-contained expression returning a
//! small JSON object, so the driver can distinguish "control missing"
//! from "control acted on" without a second round trip.

fn literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn exists(selector: &str) -> String {
    format!("!!document.querySelector({})", literal(selector))
}

pub(crate) fn click(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) {{ return {{ ok: false }}; }}
            el.click();
            return {{ ok: true }};
        }})()"#,
        sel = literal(selector),
    )
}

pub(crate) fn read_value(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) {{ return {{ ok: false }}; }}
            return {{ ok: true, value: el.value || '' }};
        }})()"#,
        sel = literal(selector),
    )
}

pub(crate) fn set_value(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) {{ return {{ ok: false }}; }}
            el.value = {value};
            el.dispatchEvent(new Event('input', {{ bubbles: true, cancelable: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true, cancelable: true }}));
            el.dispatchEvent(new KeyboardEvent('keyup', {{ bubbles: true, cancelable: true }}));
            el.focus();
            return {{ ok: true }};
        }})()"#,
        sel = literal(selector),
        value = literal(value),
    )
}

pub(crate) fn dispatch_paste(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) {{ return {{ ok: false }}; }}
            try {{
                el.dispatchEvent(new ClipboardEvent('paste', {{
                    bubbles: true,
                    cancelable: true,
                    clipboardData: new DataTransfer()
                }}));
            }} catch (err) {{
                el.dispatchEvent(new Event('paste', {{ bubbles: true, cancelable: true }}));
            }}
            return {{ ok: true }};
        }})()"#,
        sel = literal(selector),
    )
}

pub(crate) fn inner_text(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) {{ return {{ ok: false }}; }}
            return {{ ok: true, text: el.innerText || el.textContent || '' }};
        }})()"#,
        sel = literal(selector),
    )
}

pub(crate) fn click_button_with_text(text: &str, exact: bool) -> String {
    let comparison = if exact {
        "label === wanted"
    } else {
        "label.includes(wanted)"
    };
    format!(
        r#"(() => {{
            const wanted = {text};
            for (const button of document.querySelectorAll('button')) {{
                const label = (button.textContent || '').trim();
                if ({comparison}) {{
                    button.click();
                    return {{ clicked: true }};
                }}
            }}
            return {{ clicked: false }};
        }})()"#,
        text = literal(text),
    )
}

pub(crate) fn click_submit_within(anchor_selector: &str) -> String {
    format!(
        r#"(() => {{
            const anchor = document.querySelector({sel});
            if (!anchor) {{ return {{ clicked: false }}; }}
            const container = anchor.closest('.pgn-import, form, .import-pgn, [class*="pgn"]');
            if (!container) {{ return {{ clicked: false }}; }}
            const submit = container.querySelector('button[type="submit"], button.submit, .button.submit');
            if (!submit) {{ return {{ clicked: false }}; }}
            submit.click();
            return {{ clicked: true }};
        }})()"#,
        sel = literal(anchor_selector),
    )
}

/// Observer installed once per document: child-list and
/// class-attribute changes on the whole body, batches forwarded
/// through the named CDP binding. The narrowest filter that still
/// catches the source site's class toggling for game-over modals.
pub(crate) fn mutation_observer(binding: &str) -> String {
    format!(
        r#"(() => {{
            if (window.__chessbridgeObserver) {{ return; }}
            const observer = new MutationObserver((batch) => {{
                let childList = false;
                let classAttr = false;
                for (const mutation of batch) {{
                    if (mutation.type === 'childList') {{ childList = true; }}
                    else if (mutation.type === 'attributes') {{ classAttr = true; }}
                }}
                try {{
                    window[{binding}](JSON.stringify({{ childList, classAttr }}));
                }} catch (err) {{ /* binding not installed yet */ }}
            }});
            const start = () => {{
                if (document.body) {{
                    observer.observe(document.body, {{
                        childList: true,
                        subtree: true,
                        attributes: true,
                        attributeFilter: ['class']
                    }});
                }} else {{
                    setTimeout(start, 50);
                }}
            }};
            start();
            window.__chessbridgeObserver = observer;
        }})()"#,
        binding = literal(binding),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_json_escaped() {
        let script = exists("textarea.copyable[spellcheck=\"false\"]");
        assert!(script.contains("\\\"false\\\""));
    }

    #[test]
    fn exact_flag_switches_the_comparison() {
        let exact = click_button_with_text("Import PGN", true);
        assert!(exact.contains("label === wanted"));
        assert!(!exact.contains("label.includes(wanted)"));

        let partial = click_button_with_text("Import", false);
        assert!(partial.contains("label.includes(wanted)"));
        assert!(!partial.contains("label === wanted"));
    }

    #[test]
    fn observer_filters_to_childlist_and_class() {
        let script = mutation_observer("__feed");
        assert!(script.contains("attributeFilter: ['class']"));
        assert!(script.contains("childList: true"));
        assert!(script.contains("subtree: true"));
    }
}
