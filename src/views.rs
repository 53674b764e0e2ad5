//! HTML pages. Everything user-supplied goes through [`escape`].

use std::fmt::Write;

use axum::response::Html;

use crate::auth::repo_types::User;
use crate::posts::repo_types::Post;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Link to a user's profile; names may hold spaces or non-ASCII letters.
pub fn profile_href(name: &str) -> String {
    format!("/profile/{}", urlencoding::encode(name))
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    ))
}

fn nav(current_user: &str) -> String {
    format!(
        "<nav><a href=\"/home\">Home</a> | <a href=\"{href}\">{user}</a> | \
         <a href=\"/edit-profile\">Edit profile</a> | <a href=\"/logout\">Logout</a></nav>",
        href = profile_href(current_user),
        user = escape(current_user)
    )
}

pub fn login_page() -> Html<String> {
    layout(
        "Login",
        "<h1>Login</h1>\n\
         <form method=\"post\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <button type=\"submit\">Login</button>\n\
         </form>\n\
         <p><a href=\"/signup\">Sign up</a></p>",
    )
}

pub fn signup_page() -> Html<String> {
    layout(
        "Sign up",
        "<h1>Sign up</h1>\n\
         <form method=\"post\" action=\"/signup\">\n\
         <input name=\"username\" placeholder=\"Username\" required>\n\
         <input name=\"password\" type=\"password\" placeholder=\"Password\" required>\n\
         <input name=\"confirmPassword\" type=\"password\" placeholder=\"Confirm password\" required>\n\
         <button type=\"submit\">Sign up</button>\n\
         </form>\n\
         <p><a href=\"/\">Login</a></p>",
    )
}

fn post_card(out: &mut String, post: &Post, current_user: &str) {
    let id = post.id;
    let _ = write!(
        out,
        "<article id=\"post-{id}\">\n<h3><a href=\"{href}\">{author}</a></h3>\n",
        href = profile_href(&post.username),
        author = escape(&post.username)
    );
    if !post.content.is_empty() {
        let _ = writeln!(out, "<p>{}</p>", escape(&post.content));
    }
    if !post.image.is_empty() {
        let _ = writeln!(out, "<img src=\"{}\" alt=\"\">", escape(&post.image));
    }
    if !post.video.is_empty() {
        let _ = writeln!(out, "<video src=\"{}\" controls></video>", escape(&post.video));
    }

    let label = if post.is_liked_by(current_user) { "Unlike" } else { "Like" };
    let _ = writeln!(
        out,
        "<form method=\"post\" action=\"/like-post/{id}\"><button type=\"submit\">{label}</button> \
         <span class=\"likes\">{} likes</span></form>",
        post.likes_count
    );

    out.push_str("<ul class=\"comments\">\n");
    for c in &post.comments {
        let _ = writeln!(
            out,
            "<li><strong>{}</strong> {}</li>",
            escape(&c.username),
            escape(&c.content)
        );
    }
    out.push_str("</ul>\n");
    let _ = writeln!(
        out,
        "<form method=\"post\" action=\"/comment-post/{id}\">\
         <input name=\"comment\" placeholder=\"Add a comment\"><button type=\"submit\">Comment</button></form>"
    );
    out.push_str("</article>\n");
}

pub fn home_page(current_user: &str, posts: &[Post]) -> Html<String> {
    let mut body = nav(current_user);
    let _ = write!(
        body,
        "\n<h1>Welcome, {}</h1>\n\
         <form method=\"post\" action=\"/create-post\" enctype=\"multipart/form-data\">\n\
         <textarea name=\"content\" placeholder=\"What's on your mind?\"></textarea>\n\
         <input type=\"file\" name=\"image\" accept=\"image/*\">\n\
         <input type=\"file\" name=\"video\" accept=\"video/*\">\n\
         <button type=\"submit\">Post</button>\n\
         </form>\n",
        escape(current_user)
    );
    if posts.is_empty() {
        body.push_str("<p>No posts yet.</p>\n");
    }
    for post in posts {
        post_card(&mut body, post, current_user);
    }
    layout("Home", &body)
}

pub fn profile_page(current_user: &str, profile: &User, posts: &[Post]) -> Html<String> {
    let mut body = nav(current_user);
    let _ = write!(body, "\n<h1>{}</h1>\n", escape(&profile.name));
    if !profile.profile_image.is_empty() {
        let _ = writeln!(
            body,
            "<img class=\"avatar\" src=\"{}\" alt=\"\">",
            escape(&profile.profile_image)
        );
    }

    body.push_str("<dl>\n");
    let age = profile.age.map(|a| a.to_string()).unwrap_or_default();
    for (label, value) in [
        ("Email", profile.email.as_str()),
        ("Bio", profile.bio.as_str()),
        ("Education", profile.education.as_str()),
        ("Gender", profile.gender.as_str()),
        ("Age", age.as_str()),
    ] {
        if !value.is_empty() {
            let _ = writeln!(body, "<dt>{}</dt><dd>{}</dd>", label, escape(value));
        }
    }
    if !profile.certifications.is_empty() {
        let certs: Vec<String> = profile.certifications.iter().map(|c| escape(c)).collect();
        let _ = writeln!(body, "<dt>Certifications</dt><dd>{}</dd>", certs.join(", "));
    }
    body.push_str("</dl>\n");

    if current_user == profile.name {
        body.push_str("<p><a href=\"/edit-profile\">Edit profile</a></p>\n");
    }

    let _ = writeln!(body, "<h2>Posts ({})</h2>", posts.len());
    for post in posts {
        post_card(&mut body, post, current_user);
    }
    layout(&profile.name, &body)
}

/// `user` is `None` when the session's user document no longer exists; the
/// form then renders empty.
pub fn edit_profile_page(current_user: &str, user: Option<&User>) -> Html<String> {
    let field = |f: fn(&User) -> String| user.map(f).unwrap_or_default();
    let email = field(|u| u.email.clone());
    let bio = field(|u| u.bio.clone());
    let education = field(|u| u.education.clone());
    let gender = field(|u| u.gender.clone());
    let age = field(|u| u.age.map(|a| a.to_string()).unwrap_or_default());
    let certifications = field(|u| u.certifications.join(", "));

    let mut body = nav(current_user);
    let _ = write!(
        body,
        "\n<h1>Edit profile</h1>\n\
         <form method=\"post\" action=\"/edit-profile\" enctype=\"multipart/form-data\">\n\
         <input name=\"email\" value=\"{}\" placeholder=\"Email\">\n\
         <textarea name=\"bio\" placeholder=\"Bio\">{}</textarea>\n\
         <input name=\"education\" value=\"{}\" placeholder=\"Education\">\n\
         <input name=\"gender\" value=\"{}\" placeholder=\"Gender\">\n\
         <input name=\"age\" type=\"number\" value=\"{}\" placeholder=\"Age\">\n\
         <input name=\"certifications\" value=\"{}\" placeholder=\"Comma separated\">\n\
         <input type=\"file\" name=\"profileImage\" accept=\"image/*\">\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n",
        escape(&email),
        escape(&bio),
        escape(&education),
        escape(&gender),
        escape(&age),
        escape(&certifications),
    );
    layout("Edit profile", &body)
}
