//! Bridge bootstrap fragment injected into every resolved document.

const BODY_CLOSE: &str = "</body>";

/// Returns the script that forwards logs, runtime errors and context-menu
/// requests from the sandbox to the host as JSON messages.
pub(crate) fn bridge_script(instance_id: &str) -> String {
    let id = js_string_literal(instance_id);
    format!(
        r#"<script>
(function() {{
  var id = {id};
  var post = function(payload) {{ payload.id = id; window.parent.postMessage(JSON.stringify(payload), '*'); }};
  var fmt = function(args) {{
    return Array.prototype.map.call(args, function(a) {{
      return typeof a === 'object' ? JSON.stringify(a) : String(a);
    }}).join(' ');
  }};
  window.onerror = function(m, u, l) {{ post({{type: 'runtime-error', message: String(m), line: l || null}}); return false; }};
  console.log = function() {{ post({{type: 'log', level: 'info', message: fmt(arguments)}}); }};
  console.warn = function() {{ post({{type: 'log', level: 'warn', message: fmt(arguments)}}); }};
  console.error = function() {{ post({{type: 'log', level: 'error', message: fmt(arguments)}}); }};
  window.addEventListener('contextmenu', function(e) {{
    e.preventDefault();
    post({{type: 'contextmenu', x: e.clientX, y: e.clientY}});
  }});
}})();
</script>"#
    )
}

/// Inserts `fragment` before the last closing body tag, or appends it.
pub(crate) fn inject_before_body_close(document: &mut String, fragment: &str) {
    // ASCII lowering keeps byte offsets aligned with the input document.
    match document.to_ascii_lowercase().rfind(BODY_CLOSE) {
        Some(index) => document.insert_str(index, fragment),
        None => document.push_str(fragment),
    }
}

/// Encodes `value` as a JS string literal that cannot close a script element.
pub(crate) fn js_string_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}
