use crate::openapi::{Contact, Info, License};

/// Sets `dest` to `src` when empty, otherwise appends `sep + prefix + src`.
/// An empty `src` leaves `dest` untouched.
pub fn append_or_set(dest: &mut String, src: &str, prefix: &str, sep: &str) {
    if src.is_empty() {
        return;
    }
    if dest.is_empty() {
        dest.push_str(src);
    } else {
        dest.push_str(sep);
        dest.push_str(prefix);
        dest.push_str(src);
    }
}

fn append_or_set_opt(dest: &mut Option<String>, src: Option<&str>, prefix: &str, sep: &str) {
    let Some(src) = src else {
        return;
    };
    let mut value = dest.take().unwrap_or_default();
    append_or_set(&mut value, src, prefix, sep);
    *dest = (!value.is_empty()).then_some(value);
}

/// Folds `src` into `dest`, labelling appended text with the incoming title.
pub fn merge_info(dest: &mut Info, src: &Info) {
    let title = src.title.as_str();
    let upper = title.to_uppercase();

    append_or_set(&mut dest.title, title, "", ", ");
    append_or_set(&mut dest.version, &src.version, &format!("({title}) "), "\n");
    append_or_set_opt(
        &mut dest.summary,
        src.summary.as_deref(),
        &format!("{upper}: "),
        "\n\n",
    );
    append_or_set_opt(
        &mut dest.description,
        src.description.as_deref(),
        &format!("# {upper}\n\n"),
        "\n\n",
    );
    append_or_set_opt(
        &mut dest.terms_of_service,
        src.terms_of_service.as_deref(),
        &format!("{upper}\n\n"),
        "\n\n",
    );

    if let Some(contact) = &src.contact {
        merge_contact(dest.contact.get_or_insert_with(Contact::default), contact, &upper);
    }
    if let Some(license) = &src.license {
        merge_license(dest.license.get_or_insert_with(License::default), license, title);
    }
    for (key, value) in &src.extensions {
        dest.extensions
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

fn merge_contact(dest: &mut Contact, src: &Contact, upper_title: &str) {
    let prefix = format!("{upper_title}: ");
    append_or_set_opt(&mut dest.name, src.name.as_deref(), &prefix, "\n");
    append_or_set_opt(&mut dest.url, src.url.as_deref(), &prefix, "\n");
    append_or_set_opt(&mut dest.email, src.email.as_deref(), &prefix, "\n");
}

fn merge_license(dest: &mut License, src: &License, title: &str) {
    let prefix = format!("{title}: ");
    append_or_set_opt(&mut dest.name, src.name.as_deref(), &prefix, "\n");
    append_or_set_opt(&mut dest.identifier, src.identifier.as_deref(), &prefix, "\n");
    append_or_set_opt(&mut dest.url, src.url.as_deref(), &prefix, "\n");
}
