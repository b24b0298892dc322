//! Page-side half of the Chromium binding.
//!
//! The script installs `window.__afq` once per document and interprets the
//! JSON form of [`crate::query::Query`]. Elements handed back to Rust are
//! tagged with a `data-af-ref` attribute; a node re-rendered by the site
//! loses its tag and reads as detached. Every operation answers with an
//! externally tagged reply (`{"ok": …}`, `{"detached": …}`, …) so failures
//! are data rather than thrown exceptions.

use serde_json::Value;

pub(crate) const REF_ATTR: &str = "data-af-ref";

const DOM_SCRIPT: &str = r#"
window.__afq = (() => {
  const REF = 'data-af-ref';
  let nextRef = 1;

  const NAME_FROM_CONTENT = ['option', 'radio', 'checkbox', 'button', 'link', 'menuitem', 'tab', 'treeitem', 'heading'];

  const collapse = (s) => (s || '').split(/\s+/).filter(Boolean).join(' ');

  function textMatches(m, candidate) {
    const c = collapse(candidate);
    const t = collapse(m.text);
    switch (m.mode) {
      case 'exact': return c === t;
      case 'exact_fold': return c.toLowerCase() === t.toLowerCase();
      case 'contains': return c.toLowerCase().includes(t.toLowerCase());
      default: return false;
    }
  }

  function attrMatches(f, el) {
    const v = el.getAttribute(f.name);
    switch (f.test.op) {
      case 'present': return v !== null;
      case 'is': return v !== null && textMatches(f.test.value, v);
      case 'is_not': return v === null || !textMatches(f.test.value, v);
      default: return false;
    }
  }

  function selectorMatches(sel, el) {
    if (sel.tag && el.tagName.toLowerCase() !== sel.tag) return false;
    return sel.attrs.every((f) => attrMatches(f, el));
  }

  const anySelector = (sels, el) => sels.some((s) => selectorMatches(s, el));

  function implicitRole(el) {
    const tag = el.tagName.toLowerCase();
    const has = (n) => el.hasAttribute(n);
    switch (tag) {
      case 'input': {
        const ty = (el.getAttribute('type') || 'text').toLowerCase();
        if (ty === 'radio') return 'radio';
        if (ty === 'checkbox') return 'checkbox';
        if (ty === 'number') return 'spinbutton';
        if (['button', 'submit', 'reset', 'image'].includes(ty)) return 'button';
        if (['hidden', 'file', 'date', 'datetime-local', 'month', 'time', 'week', 'color', 'range', 'password'].includes(ty)) return null;
        return has('list') ? 'combobox' : 'textbox';
      }
      case 'textarea': return 'textbox';
      case 'select': {
        const size = parseInt(el.getAttribute('size') || '0', 10) || 0;
        return has('multiple') || size > 1 ? 'listbox' : 'combobox';
      }
      case 'option': return 'option';
      case 'datalist': return 'listbox';
      case 'optgroup': case 'fieldset': return 'group';
      case 'button': return 'button';
      case 'a': return has('href') ? 'link' : null;
      case 'h1': case 'h2': case 'h3': case 'h4': case 'h5': case 'h6': return 'heading';
      default: return null;
    }
  }

  function role(el) {
    const explicit = (el.getAttribute('role') || '').trim().split(/\s+/)[0];
    return explicit ? explicit.toLowerCase() : implicitRole(el);
  }

  const rendered = (el) => collapse(el.innerText !== undefined ? el.innerText : el.textContent);

  function labelTexts(el) {
    const out = [];
    const doc = el.ownerDocument;
    const by = el.getAttribute('aria-labelledby');
    if (by) {
      const text = by.split(/\s+/).map((id) => doc.getElementById(id)).filter(Boolean).map(rendered).join(' ');
      if (text) out.push(text);
    }
    const aria = el.getAttribute('aria-label');
    if (aria && aria.trim()) out.push(aria);
    if (el.id) {
      for (const l of doc.querySelectorAll('label')) {
        if (l.getAttribute('for') === el.id) out.push(rendered(l));
      }
    }
    const wrapping = el.parentElement && el.parentElement.closest('label');
    if (wrapping && !wrapping.hasAttribute('for')) out.push(rendered(wrapping));
    return out;
  }

  function accessibleName(el) {
    const labels = labelTexts(el);
    if (labels.length) return labels[0];
    if (NAME_FROM_CONTENT.includes(role(el))) {
      const text = rendered(el);
      if (text) return text;
    }
    return el.getAttribute('title') || el.getAttribute('placeholder') || '';
  }

  function descendants(root) {
    const base = root.nodeType === 9 ? root.documentElement : root;
    const all = Array.from(base.querySelectorAll('*'));
    return root.nodeType === 9 ? [base, ...all] : all;
  }

  function inDocOrder(set) {
    return Array.from(set).sort((a, b) =>
      a === b ? 0 : (a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1));
  }

  function run(q, root) {
    switch (q.kind) {
      case 'select':
        return descendants(root).filter((el) => anySelector(q.selectors, el));
      case 'role':
        return descendants(root).filter((el) =>
          role(el) === q.role.toLowerCase() && (!q.name || textMatches(q.name, accessibleName(el))));
      case 'label':
        return descendants(root).filter((el) => labelTexts(el).some((t) => textMatches(q.matcher, t)));
      case 'text':
        return descendants(root).filter((el) => anySelector(q.selectors, el) && textMatches(q.matcher, rendered(el)));
      case 'within': {
        const out = new Set();
        for (const outer of run(q.outer, root)) {
          for (const el of run(q.inner, outer)) out.add(el);
        }
        return inDocOrder(out);
      }
      case 'has':
        return descendants(root).filter((el) => anySelector(q.selectors, el) && run(q.inner, el).length > 0);
      default:
        throw new Error('unknown query kind ' + q.kind);
    }
  }

  function frameList(doc, out) {
    for (const f of doc.querySelectorAll('iframe, frame')) {
      out.push(f);
      let inner = null;
      try { inner = f.contentDocument; } catch (e) { inner = null; }
      if (inner) frameList(inner, out);
    }
    return out;
  }

  function docFor(frame) {
    if (frame === null || frame === undefined) return document;
    const f = frameList(document, [])[frame];
    if (!f) throw { detached: 'frame ' + frame + ' is gone' };
    let doc = null;
    try { doc = f.contentDocument; } catch (e) { doc = null; }
    if (!doc) throw { failed: 'frame ' + frame + ' is not accessible' };
    return doc;
  }

  function tag(el) {
    let r = el.getAttribute(REF);
    if (!r) {
      r = String(nextRef++);
      el.setAttribute(REF, r);
    }
    return Number(r);
  }

  function lookup(doc, ref) {
    const el = doc.querySelector('[' + REF + '="' + ref + '"]');
    if (!el || !el.isConnected) throw { detached: 'element ' + ref };
    return el;
  }

  function visible(el) {
    if (!el.isConnected || el.getClientRects().length === 0) return false;
    const r = el.getBoundingClientRect();
    if (r.width === 0 || r.height === 0) return false;
    const style = el.ownerDocument.defaultView.getComputedStyle(el);
    return style.display !== 'none' && style.visibility !== 'hidden';
  }

  function fire(el, ...names) {
    for (const n of names) el.dispatchEvent(new Event(n, { bubbles: true }));
  }

  function setNative(el, value) {
    const proto = Object.getPrototypeOf(el);
    const desc = Object.getOwnPropertyDescriptor(proto, 'value');
    if (desc && desc.set) desc.set.call(el, value); else el.value = value;
  }

  const ops = {
    frameCount: () => frameList(document, []).length,
    frameReady: (frame) => { docFor(frame); return true; },
    visibleText: () => (document.body ? document.body.innerText : ''),
    query: (frame, scope, q) => {
      const doc = docFor(frame);
      const root = scope === null ? doc : lookup(doc, scope);
      return run(q, root).map(tag);
    },
    closest: (frame, ref, selectors) => {
      let el = lookup(docFor(frame), ref);
      while (el && el.nodeType === 1) {
        if (anySelector(selectors, el)) return tag(el);
        el = el.parentElement;
      }
      return null;
    },
    tagName: (frame, ref) => lookup(docFor(frame), ref).tagName.toLowerCase(),
    attribute: (frame, ref, name) => lookup(docFor(frame), ref).getAttribute(name),
    attached: (frame, ref) => {
      try { lookup(docFor(frame), ref); return true; } catch (e) { return false; }
    },
    visible: (frame, ref) => visible(lookup(docFor(frame), ref)),
    checked: (frame, ref) => {
      const el = lookup(docFor(frame), ref);
      if ('checked' in el && el.tagName.toLowerCase() === 'input') return !!el.checked;
      return el.getAttribute('aria-checked') === 'true';
    },
    innerText: (frame, ref) => rendered(lookup(docFor(frame), ref)),
    inputValue: (frame, ref) => {
      const el = lookup(docFor(frame), ref);
      if ('value' in el && typeof el.value === 'string') return el.value;
      return el.isContentEditable ? el.innerText : '';
    },
    scroll: (frame, ref) => {
      lookup(docFor(frame), ref).scrollIntoView({ block: 'center', inline: 'center' });
      return null;
    },
    point: (frame, ref) => {
      const el = lookup(docFor(frame), ref);
      el.scrollIntoView({ block: 'center', inline: 'center' });
      if (!visible(el)) throw { not_interactable: 'element ' + ref + ' is not visible' };
      const r = el.getBoundingClientRect();
      let x = r.left + r.width / 2;
      let y = r.top + r.height / 2;
      let win = el.ownerDocument.defaultView;
      while (win && win.frameElement) {
        const fr = win.frameElement.getBoundingClientRect();
        x += fr.left + win.frameElement.clientLeft;
        y += fr.top + win.frameElement.clientTop;
        win = win.parent;
      }
      return { x, y };
    },
    focus: (frame, ref) => { lookup(docFor(frame), ref).focus(); return null; },
    clear: (frame, ref) => {
      const el = lookup(docFor(frame), ref);
      el.focus();
      if ('value' in el && typeof el.value === 'string') {
        setNative(el, '');
        fire(el, 'input');
      } else if (el.isContentEditable) {
        el.textContent = '';
        fire(el, 'input');
      }
      return null;
    },
    setValue: (frame, ref, value) => {
      const el = lookup(docFor(frame), ref);
      el.focus();
      setNative(el, value);
      fire(el, 'input', 'change');
      return null;
    },
    selectOption: (frame, ref, value) => {
      const el = lookup(docFor(frame), ref);
      const option = Array.from(el.options || []).find((o) => o.value === value);
      if (!option) throw { failed: 'no option with value ' + value };
      option.selected = true;
      fire(el, 'input', 'change');
      return null;
    },
  };

  return {
    call(op, args) {
      try {
        return { ok: ops[op](...args) };
      } catch (e) {
        if (e && (e.detached || e.not_interactable || e.failed)) return e;
        return { failed: String(e && e.message ? e.message : e) };
      }
    },
  };
})();
"#;

/// Expression that installs the script if needed, runs `op` and returns
/// the reply serialized as a JSON string.
pub(crate) fn call_expression(op: &str, args: &[Value]) -> String {
    let op = Value::String(op.to_string());
    let args = Value::Array(args.to_vec());
    format!(
        "(() => {{ if (!window.__afq) {{ {DOM_SCRIPT} }} return JSON.stringify(window.__afq.call({op}, {args})); }})()"
    )
}
