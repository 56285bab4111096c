// Export filter: only exported declarations and members are bound.
//
// Runs before code assignment, so unexported members never occupy a code
// and exporting a new trailing member never renumbers existing ones.

use crate::naming::is_exported;
use crate::schema::{Declaration, Package};

/// Copy of `package` with every unexported declaration, field and method
/// removed. Declared order is preserved.
pub fn exported_surface(package: &Package) -> Package {
    let mut removed = 0usize;
    let mut declarations = Vec::with_capacity(package.declarations.len());

    for decl in &package.declarations {
        if !is_exported(decl.name()) {
            removed += 1;
            continue;
        }
        let mut decl = decl.clone();
        match &mut decl {
            Declaration::Function(_) => {}
            Declaration::Struct(s) => {
                let before = s.fields.len() + s.methods.len();
                s.fields.retain(|f| is_exported(&f.name));
                s.methods.retain(|m| is_exported(&m.name));
                removed += before - s.fields.len() - s.methods.len();
            }
            Declaration::Interface(i) => {
                let before = i.methods.len();
                i.methods.retain(|m| is_exported(&m.name));
                removed += before - i.methods.len();
            }
        }
        declarations.push(decl);
    }

    tracing::debug!(
        package = %package.name,
        kept = declarations.len(),
        removed,
        "filtered unexported declarations and members"
    );

    Package {
        name: package.name.clone(),
        path: package.path.clone(),
        declarations,
    }
}
