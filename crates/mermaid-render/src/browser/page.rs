//! Scratch HTML for the browser-assisted export.
//!
//! The page loads Mermaid from a CDN, renders the embedded source client-side and offers three
//! ways to get the SVG out: a blob download, a "save to file" request against the companion page
//! (which has no backend and only pretends to succeed), and a base64 copy that the operator can
//! paste back into the console prompt.

use crate::config::{MERMAID_SCRIPT_URL, SCRATCH_SAVE_PAGE, Theme};
use crate::source::DiagramSource;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MermaidInit<'a> {
    start_on_load: bool,
    theme: &'a str,
    security_level: &'a str,
}

/// The two scratch pages for one diagram.
#[derive(Debug, Clone)]
pub struct BrowserPage {
    pub render_html: String,
    pub save_handler_html: String,
}

impl BrowserPage {
    pub fn build(source: &DiagramSource, diagram_text: &str, theme: Theme) -> Self {
        Self {
            render_html: render_page(source, diagram_text, theme),
            save_handler_html: SAVE_HANDLER_TEMPLATE.to_string(),
        }
    }
}

fn js_string(s: &str) -> String {
    // A JSON string is a valid JS string literal; `</` is split so the value can't close the
    // surrounding <script> element.
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

fn render_page(source: &DiagramSource, diagram_text: &str, theme: Theme) -> String {
    let output = source.output.to_string_lossy();
    let init = MermaidInit {
        start_on_load: true,
        theme: theme.as_str(),
        security_level: "loose",
    };
    let init_json = serde_json::to_string(&init).unwrap_or_else(|_| "{}".to_string());

    RENDER_TEMPLATE
        .replace("__MERMAID_SCRIPT_URL__", MERMAID_SCRIPT_URL)
        .replace("__OUTPUT_PATH_HTML__", &htmlize::escape_text(&*output))
        .replace("__MERMAID_INIT__", &init_json)
        .replace("__OUTPUT_PATH_JS__", &js_string(&output))
        .replace("__OUTPUT_NAME_JS__", &js_string(&source.output_file_name()))
        .replace("__SAVE_HANDLER_JS__", &js_string(SCRATCH_SAVE_PAGE))
        // Last: the diagram text is user content and must not be scanned for placeholders.
        .replace("__DIAGRAM_SOURCE__", &htmlize::escape_text(diagram_text))
}

const RENDER_TEMPLATE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Mermaid Renderer</title>
  <script src="__MERMAID_SCRIPT_URL__"></script>
  <style>
    body { margin: 0; padding: 20px; }
    #download-container { position: fixed; top: 20px; right: 20px; display: flex; flex-direction: column; gap: 10px; }
    .download-btn { padding: 10px 15px; background-color: #4CAF50; color: white; border: none; border-radius: 4px; cursor: pointer; font-size: 14px; text-align: center; }
    .download-btn:hover { background-color: #45a049; }
    #server-save-btn { background-color: #2196F3; }
    #server-save-btn:hover { background-color: #0b7dda; }
    .mermaid { margin-top: 60px; }
    .instructions { font-family: sans-serif; background-color: #f8f9fa; padding: 15px; border-radius: 5px; margin-bottom: 20px; max-width: 800px; }
    #status-message { color: #4CAF50; font-weight: bold; margin-top: 10px; display: none; }
    #console-message { display: none; font-family: monospace; background-color: #f1f1f1; padding: 10px; border-radius: 4px; margin-top: 20px; white-space: pre-wrap; word-break: break-all; }
    textarea { width: 100%; height: 100px; margin-top: 20px; display: none; }
  </style>
</head>
<body>
  <div class="instructions">
    <h2>Mermaid Renderer</h2>
    <p>Your diagram renders below. Save the SVG with one of these:</p>
    <ol>
      <li><strong>Download SVG</strong> saves through the browser's download manager.</li>
      <li><strong>Save SVG to File</strong> tries a different route around download restrictions.</li>
      <li><strong>Copy SVG as Base64</strong> copies the SVG so it can be pasted into the waiting console prompt.</li>
    </ol>
    <p>Output will be saved to: <strong>__OUTPUT_PATH_HTML__</strong></p>
    <div id="status-message"></div>
    <div id="console-message"></div>
  </div>

  <div id="download-container">
    <a id="download-link" class="download-btn" href="#">Download SVG</a>
    <button id="server-save-btn" class="download-btn">Save SVG to File</button>
    <button id="copy-base64-btn" class="download-btn">Copy SVG as Base64</button>
  </div>

  <div class="mermaid">
__DIAGRAM_SOURCE__
  </div>

  <textarea id="svg-base64" readonly></textarea>

  <script>
    const OUTPUT_PATH = __OUTPUT_PATH_JS__;
    const OUTPUT_NAME = __OUTPUT_NAME_JS__;
    const SAVE_HANDLER = __SAVE_HANDLER_JS__;

    mermaid.initialize(__MERMAID_INIT__);
    setTimeout(initializeDownload, 1000);

    function showMessage(message, isError = false) {
      const el = document.getElementById('status-message');
      el.textContent = message;
      el.style.color = isError ? '#f44336' : '#4CAF50';
      el.style.display = 'block';
    }

    function getSvgSource() {
      const svg = document.querySelector('.mermaid svg');
      if (!svg) {
        showMessage('SVG not found. Wait for the diagram to finish rendering.', true);
        return null;
      }
      let source = new XMLSerializer().serializeToString(svg);
      if (!source.match(/^<svg[^>]+xmlns="http:\/\/www\.w3\.org\/2000\/svg"/)) {
        source = source.replace(/^<svg/, '<svg xmlns="http://www.w3.org/2000/svg"');
      }
      if (!source.match(/^<svg[^>]+"http:\/\/www\.w3\.org\/1999\/xlink"/)) {
        source = source.replace(/^<svg/, '<svg xmlns:xlink="http://www.w3.org/1999/xlink"');
      }
      return '<?xml version="1.0" standalone="no"?>\r\n' + source;
    }

    function initializeDownload() {
      document.getElementById('download-link').addEventListener('click', function (e) {
        e.preventDefault();
        const source = getSvgSource();
        if (!source) return;
        try {
          const url = URL.createObjectURL(new Blob([source], { type: 'image/svg+xml' }));
          const a = document.createElement('a');
          a.href = url;
          a.download = OUTPUT_NAME;
          document.body.appendChild(a);
          a.click();
          a.remove();
          setTimeout(() => URL.revokeObjectURL(url), 100);
          showMessage('Download initiated. Move ' + OUTPUT_NAME + ' to ' + OUTPUT_PATH + '.');
        } catch (error) {
          showMessage('Download failed: ' + error.message, true);
        }
      });

      document.getElementById('server-save-btn').addEventListener('click', function () {
        const source = getSvgSource();
        if (!source) return;
        fetch(SAVE_HANDLER, {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ svg: source, filename: OUTPUT_NAME, output_path: OUTPUT_PATH }),
        })
          .then((response) => {
            if (response.ok) {
              showMessage('SVG saved successfully to ' + OUTPUT_PATH);
            } else {
              showMessage('Failed to save SVG file on server', true);
            }
          })
          .catch((error) => showMessage('Error saving file: ' + error.message, true));
      });

      document.getElementById('copy-base64-btn').addEventListener('click', function () {
        const source = getSvgSource();
        if (!source) return;
        try {
          const base64 = btoa(unescape(encodeURIComponent(source)));
          const textarea = document.getElementById('svg-base64');
          textarea.value = base64;
          textarea.style.display = 'block';
          textarea.select();
          if (navigator.clipboard) {
            navigator.clipboard.writeText(base64).catch(() => document.execCommand('copy'));
          } else {
            document.execCommand('copy');
          }
          const help = document.getElementById('console-message');
          help.style.display = 'block';
          help.textContent =
            '# Base64 copied to clipboard.\n' +
            '# In the terminal running the renderer, answer "y" and paste it to write:\n' +
            '#   ' + OUTPUT_PATH;
          showMessage('Base64 copied to clipboard! See instructions below.');
        } catch (error) {
          showMessage('Base64 conversion failed: ' + error.message, true);
        }
      });
    }
  </script>
</body>
</html>
"##;

const SAVE_HANDLER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>SVG Save Handler</title>
</head>
<body>
  <h1>SVG Save Handler</h1>
  <p>This page acknowledges save requests from the renderer page. Nothing is written to disk.</p>
  <script>
    window.addEventListener('message', function (event) {
      try {
        if (event.data && event.data.svg && event.data.output_path) {
          window.parent.postMessage({ status: 'success', message: 'SVG data received' }, '*');
        }
      } catch (error) {
        console.error('Error handling message:', error);
      }
    }, false);
  </script>
</body>
</html>
"#;
