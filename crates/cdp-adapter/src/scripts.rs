//! Page-side scripts evaluated by [`crate::ChromiumDriver`].
//!
//! Elements found by a query are stamped with `data-surfpilot-handle` so later calls can
//! address them without holding remote object ids.

use serde_json::Value;

use crate::driver::{ElementQuery, ScrollTo};

pub(crate) const HANDLE_ATTR: &str = "data-surfpilot-handle";

const ROLE_HELPERS: &str = r#"
const __implicitRole = (el) => {
  const explicit = (el.getAttribute('role') || '').trim().split(/\s+/)[0];
  if (explicit) return explicit.toLowerCase();
  const tag = el.tagName.toLowerCase();
  const type = (el.getAttribute('type') || 'text').toLowerCase();
  switch (tag) {
    case 'a': return el.hasAttribute('href') ? 'link' : 'generic';
    case 'button': return 'button';
    case 'select': return el.multiple || el.size > 1 ? 'listbox' : 'combobox';
    case 'textarea': return 'textbox';
    case 'option': return 'option';
    case 'img': return 'img';
    case 'h1': case 'h2': case 'h3': case 'h4': case 'h5': case 'h6': return 'heading';
    case 'input':
      if (['button', 'submit', 'reset', 'image'].includes(type)) return 'button';
      if (type === 'checkbox') return 'checkbox';
      if (type === 'radio') return 'radio';
      if (type === 'range') return 'slider';
      if (type === 'search') return 'searchbox';
      if (type === 'hidden') return 'none';
      return el.hasAttribute('list') ? 'combobox' : 'textbox';
    default: return 'generic';
  }
};
const __accessibleName = (el) => {
  const labelledBy = el.getAttribute('aria-labelledby');
  if (labelledBy) {
    const text = labelledBy.split(/\s+/)
      .map((id) => document.getElementById(id))
      .filter(Boolean)
      .map((node) => node.textContent || '')
      .join(' ').trim();
    if (text) return text;
  }
  const aria = el.getAttribute('aria-label');
  if (aria && aria.trim()) return aria.trim();
  if (el.labels && el.labels.length) {
    const text = Array.from(el.labels).map((l) => l.textContent || '').join(' ').trim();
    if (text) return text;
  }
  const tag = el.tagName.toLowerCase();
  if (tag === 'input') {
    const type = (el.getAttribute('type') || '').toLowerCase();
    if (['button', 'submit', 'reset'].includes(type) && el.value) return el.value;
  }
  if (tag === 'img') return el.getAttribute('alt') || '';
  const text = (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim();
  if (text) return text;
  return el.getAttribute('title') || el.getAttribute('placeholder') || '';
};
const __visible = (el) => {
  const style = window.getComputedStyle(el);
  if (style.visibility === 'hidden' || style.display === 'none') return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 && rect.height > 0;
};
"#;

const INTERACTIVE_SELECTOR: &str = "a[href], button, input:not([type=hidden]), select, textarea, [role=button], [role=link], [role=checkbox], [role=radio], [role=textbox], [role=combobox], [role=searchbox], [role=tab], [role=menuitem], [role=switch], [onclick]";

fn literal(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Resolve a query to stamped handles: `[{handle, description}]`.
pub(crate) fn query(query: &ElementQuery) -> String {
    let spec = serde_json::to_string(query).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"(() => {{
{ROLE_HELPERS}
  const spec = {spec};
  let found = [];
  if (spec.by === 'xpath') {{
    const snap = document.evaluate(spec.xpath, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    for (let i = 0; i < snap.snapshotLength; i++) found.push(snap.snapshotItem(i));
  }} else if (spec.by === 'css') {{
    found = Array.from(document.querySelectorAll(spec.selector));
  }} else if (spec.by === 'attribute') {{
    found = Array.from(document.querySelectorAll('[' + spec.name + ']'))
      .filter((el) => el.getAttribute(spec.name) === spec.value);
  }} else if (spec.by === 'role') {{
    const wanted = spec.name.trim().toLowerCase();
    found = Array.from(document.querySelectorAll('*')).filter((el) => {{
      if (__implicitRole(el) !== spec.role.toLowerCase()) return false;
      const name = __accessibleName(el).toLowerCase();
      return spec.exact ? name === wanted : name.includes(wanted);
    }});
  }}
  found = found.filter((el) => el instanceof Element && __visible(el));
  window.__surfpilotSeq = window.__surfpilotSeq || 0;
  return found.map((el) => {{
    let handle = el.getAttribute('{HANDLE_ATTR}');
    if (!handle) {{
      window.__surfpilotSeq += 1;
      handle = 'h' + window.__surfpilotSeq;
      el.setAttribute('{HANDLE_ATTR}', handle);
    }}
    return {{ handle, description: el.tagName.toLowerCase() + ' "' + __accessibleName(el).slice(0, 60) + '"' }};
  }});
}})()"#
    )
}

fn with_element(handle: &str, body: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector('[{HANDLE_ATTR}="' + {handle} + '"]');
  if (!el) return {{ ok: false, reason: 'detached' }};
{body}
}})()"#,
        handle = literal(handle)
    )
}

/// Scroll into view and report the centre point plus what sits on top of it.
pub(crate) fn click_point(handle: &str) -> String {
    with_element(
        handle,
        r#"  el.scrollIntoView({ block: 'center', inline: 'center' });
  const rect = el.getBoundingClientRect();
  const x = rect.left + rect.width / 2;
  const y = rect.top + rect.height / 2;
  const top = document.elementFromPoint(x, y);
  const hit = !!top && (top === el || el.contains(top) || top.contains(el));
  const disabled = el.disabled === true || el.getAttribute('aria-disabled') === 'true';
  return { ok: true, x, y, hit, disabled, width: rect.width, height: rect.height };"#,
    )
}

/// Bounding box in document coordinates, for clipped captures.
pub(crate) fn element_rect(handle: &str) -> String {
    with_element(
        handle,
        r#"  el.scrollIntoView({ block: 'center', inline: 'center' });
  const rect = el.getBoundingClientRect();
  return { ok: rect.width > 0 && rect.height > 0, reason: 'empty box', x: rect.left + window.scrollX, y: rect.top + window.scrollY, width: rect.width, height: rect.height };"#,
    )
}

pub(crate) fn script_click(handle: &str) -> String {
    with_element(handle, "  el.click();\n  return { ok: true };")
}

pub(crate) fn focus(handle: &str) -> String {
    with_element(handle, "  el.focus();\n  return { ok: document.activeElement === el || el.contains(document.activeElement) };")
}

pub(crate) fn clear(handle: &str) -> String {
    with_element(
        handle,
        r#"  el.focus();
  if ('value' in el) {
    el.value = '';
  } else if (el.isContentEditable) {
    el.textContent = '';
  }
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));
  return { ok: true };"#,
    )
}

pub(crate) fn select_option(handle: &str, option: &str) -> String {
    let body = format!(
        r#"  if (el.tagName.toLowerCase() !== 'select') return {{ ok: false, reason: 'not a select' }};
  const wanted = {option}.trim().toLowerCase();
  const options = Array.from(el.options);
  const match = options.find((o) => o.value.toLowerCase() === wanted)
    || options.find((o) => o.text.trim().toLowerCase() === wanted)
    || options.find((o) => o.text.trim().toLowerCase().includes(wanted));
  if (!match) return {{ ok: false, reason: 'option' }};
  el.value = match.value;
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return {{ ok: true }};"#,
        option = literal(option)
    );
    with_element(handle, &body)
}

pub(crate) fn scroll_into_view(handle: &str) -> String {
    with_element(
        handle,
        "  el.scrollIntoView({ block: 'center', inline: 'nearest' });\n  return { ok: true };",
    )
}

pub(crate) fn attributes(handle: &str) -> String {
    with_element(
        handle,
        r#"  const attrs = {};
  for (const attr of Array.from(el.attributes)) attrs[attr.name] = attr.value;
  attrs['tag'] = el.tagName.toLowerCase();
  return { ok: true, attrs };"#,
    )
}

pub(crate) fn scroll_window(to: ScrollTo) -> String {
    match to {
        ScrollTo::By(px) => format!("window.scrollBy(0, {px}); true"),
        ScrollTo::Top => "window.scrollTo(0, 0); true".to_string(),
        ScrollTo::Bottom => {
            "window.scrollTo(0, document.documentElement.scrollHeight); true".to_string()
        }
    }
}

pub(crate) fn count_interactive() -> String {
    format!(
        r#"(() => {{
{ROLE_HELPERS}
  return Array.from(document.querySelectorAll('{INTERACTIVE_SELECTOR}')).filter(__visible).length;
}})()"#
    )
}

pub(crate) const VISIBLE_TEXT: &str = "document.body ? document.body.innerText : ''";

pub(crate) const READY_STATE: &str = "document.readyState";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_script_embeds_the_serialized_query() {
        let script = query(&ElementQuery::Attribute {
            name: "aria-label".into(),
            value: "Search \"jobs\"".into(),
        });
        assert!(script.contains(r#""by":"attribute""#));
        assert!(script.contains(r#"Search \"jobs\""#));
        assert!(script.contains(HANDLE_ATTR));
    }

    #[test]
    fn handles_are_quoted_as_js_strings() {
        let script = click_point("h1'); alert(1); ('");
        assert!(script.contains(r#""h1'); alert(1); ('""#));
    }
}
