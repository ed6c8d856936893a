//! File-backed persistence and first-run bootstrap

use foreman::agent::SubAgentRegistry;
use foreman::core::Role;
use foreman::{Config, Conversation, ConversationStore, FileConversationStore, ForemanError};

#[tokio::test]
async fn test_conversation_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConversationStore::in_data_dir(dir.path());
    store.init().await.unwrap();

    let mut conversation = Conversation::new();
    conversation.add_user("What's 2+2?");
    conversation.add_assistant("4");
    store.save(&conversation).await.unwrap();

    let path = dir
        .path()
        .join("conversations")
        .join(format!("{}.json", conversation.id()));
    assert!(path.exists());

    // A fresh store over the same directory sees the record
    let reopened = FileConversationStore::in_data_dir(dir.path());
    assert!(reopened.exists(conversation.id()).await.unwrap());

    let loaded = reopened.load(conversation.id()).await.unwrap();
    assert_eq!(loaded, conversation);
    assert_eq!(loaded.messages()[1].role(), Role::Assistant);
}

#[tokio::test]
async fn test_save_overwrites_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConversationStore::new(dir.path());
    store.init().await.unwrap();

    let mut conversation = Conversation::with_id("thread-1");
    conversation.add_user("one");
    store.save(&conversation).await.unwrap();
    conversation.add_assistant("two");
    store.save(&conversation).await.unwrap();

    assert_eq!(store.load("thread-1").await.unwrap().len(), 2);

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["thread-1.json".to_string()]);
}

#[tokio::test]
async fn test_missing_conversation_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConversationStore::new(dir.path());
    store.init().await.unwrap();

    assert!(!store.exists("ghost").await.unwrap());
    let err = store.load("ghost").await.unwrap_err();
    assert!(matches!(err, ForemanError::ConversationNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn test_record_uses_author_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConversationStore::new(dir.path());
    store.init().await.unwrap();

    let mut conversation = Conversation::with_id("wire");
    conversation.add_user("hi");
    store.save(&conversation).await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join("wire.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["id"], "wire");
    assert_eq!(json["messages"][0]["author"], "user");
    assert_eq!(json["messages"][0]["content"], "hi");
}

#[test]
fn test_first_run_writes_default_files() {
    let dir = tempfile::tempdir().unwrap();

    let registry = SubAgentRegistry::initialize(dir.path()).unwrap();
    assert_eq!(registry.ids(), vec!["programmer", "project_manager"]);
    assert!(SubAgentRegistry::agents_file(dir.path()).exists());

    let config_path = Config::config_file(dir.path());
    assert!(!config_path.exists());
    Config::default().save(dir.path()).unwrap();
    let reloaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(reloaded.ai.provider, "openrouter");
    assert_eq!(reloaded.ai.model, "deepseek/deepseek-v3.2");
}
