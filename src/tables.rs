use super::*;

/// Wraps every table under `scope` in a horizontally scrollable container,
/// unless its parent already is one. Returns the number of tables wrapped.
pub(crate) fn wrap_tables(dom: &mut Dom, scope: NodeId, config: &TablesConfig) -> Result<usize> {
    let mut wrapped = 0;
    for table in dom.query_selector_all_from(scope, "table")? {
        let Some(parent) = dom.parent(table) else {
            continue;
        };
        if dom.class_contains(parent, &config.container_class) {
            continue;
        }
        let wrapper = dom.create_detached_element("div");
        dom.set_attr(wrapper, "class", &config.container_class)?;
        dom.insert_before(parent, wrapper, table)?;
        dom.append_child(wrapper, table)?;
        wrapped += 1;
    }
    if wrapped > 0 {
        tracing::debug!(count = wrapped, "wrapped tables");
    }
    Ok(wrapped)
}
