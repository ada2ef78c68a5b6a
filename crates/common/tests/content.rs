//! Integration tests for content mutation through the repository

mod common;

use ::common::prelude::*;

#[tokio::test]
async fn test_hello_world_page_is_listed() {
    let site = common::setup_site();
    let repo = common::repository(&site, "auto_metadata:\n  md: [date]\n");

    // Create the page
    let change = repo
        .create_page(Root::Content, "", "Hello World")
        .await
        .unwrap();
    assert_eq!(change.name, "hello-world.md");
    assert_eq!(change.message, "Created page hello-world.md in content");
    let text = site.read("content/hello-world.md");
    assert!(text.starts_with("---\ntitle: Hello World\ndate: "));

    // It shows up in the listing and in a search
    let listing = repo
        .list(Root::Content, "", SortOrder::Name, None, 1)
        .await
        .unwrap();
    assert_eq!(listing.entries.len(), 1);
    assert_eq!(listing.entries[0].name, "hello-world.md");
    assert!(!listing.entries[0].is_directory);

    let found = repo
        .list(Root::Content, "", SortOrder::Name, Some("HELLO world"), 1)
        .await
        .unwrap();
    assert_eq!(found.total_entries, 1);

    // A second page with the same title does not clobber the first
    let err = repo
        .create_page(Root::Content, "", "hello, world!")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(site.read("content/hello-world.md"), text);
}

#[tokio::test]
async fn test_listing_hides_dotfiles_and_rejects_escapes() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("content/.secret", "x");
    site.write("content/posts/a.md", "a");

    let listing = repo
        .list(Root::Content, "", SortOrder::Name, None, 1)
        .await
        .unwrap();
    let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["posts"]);

    for path in ["..", "../tmp", "posts/../../wmk_admin.yaml", "/etc"] {
        let err = repo
            .list(Root::Content, path, SortOrder::Name, None, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape, "{}", path);
    }
}

#[tokio::test]
async fn test_rename_to_same_name_is_noop() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("content/posts/a.md", "a");

    let outcome = repo
        .move_or_rename(&MoveRequest {
            from_root: Root::Content,
            from_dir: "posts".to_string(),
            orig_name: "a.md".to_string(),
            to_root: Root::Content,
            to_dir: "posts/".to_string(),
            new_name: "a.md".to_string(),
            is_dir: false,
        })
        .await
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Unchanged);
    assert_eq!(site.read("content/posts/a.md"), "a");
}

#[tokio::test]
async fn test_directory_moves_across_roots() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("static/img/logo.png", "png");

    let outcome = repo
        .move_or_rename(&MoveRequest {
            from_root: Root::Static,
            from_dir: String::new(),
            orig_name: "img".to_string(),
            to_root: Root::Data,
            to_dir: String::new(),
            new_name: "img".to_string(),
            is_dir: true,
        })
        .await
        .unwrap();
    let MoveOutcome::Moved(change) = outcome else {
        panic!("expected the directory to move");
    };
    assert_eq!(change.message, "Moved the directory img from static to data");
    assert_eq!(site.read("data/img/logo.png"), "png");
    assert!(!site.path("static/img").exists());
}

#[tokio::test]
async fn test_upload_name_is_sanitized_and_disambiguated() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("static/img/.keep", "");

    let upload = |bytes: &[u8]| UploadRequest {
        dest: "static/img".to_string(),
        declared_name: None,
        source_filename: "My Photo (final)  .PNG".to_string(),
        bytes: bytes.to_vec(),
    };

    // First upload keeps the derived name
    let first = repo.accept_upload(upload(b"one")).await.unwrap();
    assert_eq!(first.name, "my_photo_(final)_.png");
    assert_eq!(first.message, "File my_photo_(final)_.png uploaded to static/img");

    // Second upload of the same file gets a random suffix
    let second = repo.accept_upload(upload(b"two")).await.unwrap();
    assert_ne!(second.name, first.name);
    assert!(second.name.starts_with("my_photo_(final)___"));
    assert!(second.name.ends_with(".png"));

    // Later uploads are suffixed once, from the derived name
    for _ in 0..5 {
        let again = repo.accept_upload(upload(b"again")).await.unwrap();
        assert_eq!(again.name.len(), first.name.len() + "__ABCDE".len());
        assert!(again.name.starts_with("my_photo_(final)___"));
    }

    // Neither file was overwritten
    assert_eq!(site.read("static/img/my_photo_(final)_.png"), "one");
    assert_eq!(
        std::fs::read_to_string(&second.path).unwrap(),
        "two"
    );
}

#[tokio::test]
async fn test_upload_with_declared_name() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("static/logo.png", "old");

    let request = |name: &str| UploadRequest {
        dest: "/static/".to_string(),
        declared_name: Some(name.to_string()),
        source_filename: "whatever.png".to_string(),
        bytes: b"new".to_vec(),
    };

    // An explicit name never gets disambiguated
    let err = repo.accept_upload(request("/logo.png/")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(site.read("static/logo.png"), "old");

    let err = repo.accept_upload(request("a/b.png")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidName);

    let err = repo.accept_upload(request(".htaccess")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidName);

    let err = repo.accept_upload(request("README")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingExtension);

    let change = repo.accept_upload(request("Logo 2.png")).await.unwrap();
    assert_eq!(change.name, "Logo 2.png");
}

#[tokio::test]
async fn test_upload_destination_must_be_sanctioned() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");

    for (dest, kind) in [
        ("htdocs", ErrorKind::PolicyViolation),
        ("tmp", ErrorKind::PolicyViolation),
        ("content/../tmp", ErrorKind::PathEscape),
        ("content/missing", ErrorKind::NotFound),
    ] {
        let err = repo
            .accept_upload(UploadRequest {
                dest: dest.to_string(),
                declared_name: None,
                source_filename: "a.png".to_string(),
                bytes: vec![1],
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "{}", dest);
    }
}

#[tokio::test]
async fn test_saved_metadata_is_idempotent() {
    let site = common::setup_site();
    let repo = common::repository(
        &site,
        "auto_metadata:\n  md: [created_date, modified_date]\n",
    );
    site.write("content/post.md", "---\ntitle: Post\n---\nBody\r\n");
    let target = EditTarget::Root {
        root: Root::Content,
        path: "post.md".to_string(),
    };

    let first = repo.read(&target).await.unwrap();
    repo.save(&target, &first).await.unwrap();
    let saved_once = repo.read(&target).await.unwrap();
    let created = saved_once
        .lines()
        .find(|l| l.starts_with("created_date: "))
        .unwrap()
        .to_string();
    assert!(saved_once.ends_with("Body\n"));

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    repo.save(&target, &saved_once).await.unwrap();
    let saved_twice = repo.read(&target).await.unwrap();

    // created_date survives, modified_date moves forward
    assert!(saved_twice.contains(&created));
    assert_eq!(saved_twice.matches("created_date:").count(), 1);
    assert_eq!(saved_twice.matches("modified_date:").count(), 1);
    let modified = |text: &str| {
        text.lines()
            .find(|l| l.starts_with("modified_date: "))
            .unwrap()
            .to_string()
    };
    assert!(modified(&saved_twice) > modified(&saved_once));
}

#[tokio::test]
async fn test_editing_is_confined() {
    let site = common::setup_site();
    let repo = common::repository(&site, "");
    site.write("wmk_admin.yaml", "admin_password: x");

    let err = repo
        .read(&EditTarget::Root {
            root: Root::Content,
            path: "../wmk_admin.yaml".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathEscape);

    let err = repo.read(&EditTarget::Config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
