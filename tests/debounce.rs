use std::sync::{Arc, Mutex};
use std::time::Duration;

use pictor::{
    Config, Debouncer, GeneratedImage, ImageGenerator, ImageModel, ImageRequest, Placeholder,
    ProviderId, SequenceGate,
};

#[tokio::test(start_paused = true)]
async fn live_typing_burst_yields_one_generation_with_the_last_prompt() {
    let generator = Arc::new(
        ImageGenerator::new(&Config::default())
            .with_placeholder(Placeholder::new().with_simulated_delay(Duration::ZERO)),
    );
    let results = Arc::new(Mutex::new(Vec::<GeneratedImage>::new()));

    let applied = Arc::clone(&results);
    let debouncer = Debouncer::new(Duration::from_millis(1000), move |prompt: String| {
        let generator = Arc::clone(&generator);
        let applied = Arc::clone(&applied);
        async move {
            let image = generator
                .generate_on(ProviderId::Placeholder, &prompt)
                .await
                .expect("placeholder never fails");
            applied.lock().expect("results lock").push(image);
        }
    });

    debouncer.call("w");
    tokio::time::sleep(Duration::from_millis(200)).await;
    debouncer.call("wi");
    tokio::time::sleep(Duration::from_millis(200)).await;
    debouncer.call("winter cabin");
    tokio::time::sleep(Duration::from_millis(5000)).await;

    let results = results.lock().expect("results lock");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].prompt, "winter cabin");
    assert!(results[0].image_url.contains("winter%20cabin"));
}

#[tokio::test(start_paused = true)]
async fn enter_key_commit_fires_once_and_swallows_the_pending_preview() {
    let submitted = Arc::new(Mutex::new(Vec::<String>::new()));

    let applied = Arc::clone(&submitted);
    let debouncer = Debouncer::new(Duration::from_millis(1000), move |prompt: String| {
        let applied = Arc::clone(&applied);
        async move {
            // Models the network round trip the generation call would take.
            tokio::time::sleep(Duration::from_millis(500)).await;
            applied.lock().expect("submitted lock").push(prompt);
        }
    });

    // Typing schedules a preview; Enter commits immediately. Only the commit
    // may fire, and a stray debounce timer must not double-fire behind it.
    debouncer.call("winter cab");
    tokio::time::sleep(Duration::from_millis(300)).await;
    debouncer.call_now("winter cabin");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(debouncer.is_busy());
    tokio::time::sleep(Duration::from_millis(5000)).await;

    let submitted = submitted.lock().expect("submitted lock");
    assert_eq!(submitted.as_slice(), ["winter cabin"]);
    assert!(!debouncer.is_busy());
}

#[tokio::test(start_paused = true)]
async fn superseded_results_are_dropped_not_applied() {
    let gate = SequenceGate::new();
    let applied = Arc::new(Mutex::new(Vec::<String>::new()));

    // An older, slower request is still in flight when a newer one lands.
    // Both complete; only the newer result may be applied.
    let slow = Placeholder::new().with_simulated_delay(Duration::from_millis(2000));
    let older_ticket = gate.issue();
    let older = tokio::spawn({
        let applied = Arc::clone(&applied);
        async move {
            let image = slow
                .generate(ImageRequest::new("first draft"))
                .await
                .expect("placeholder never fails");
            if !older_ticket.is_superseded() {
                applied.lock().expect("applied lock").push(image.prompt);
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let fast = Placeholder::new().with_simulated_delay(Duration::from_millis(100));
    let newer_ticket = gate.issue();
    let newer = tokio::spawn({
        let applied = Arc::clone(&applied);
        async move {
            let image = fast
                .generate(ImageRequest::new("final prompt"))
                .await
                .expect("placeholder never fails");
            if !newer_ticket.is_superseded() {
                applied.lock().expect("applied lock").push(image.prompt);
            }
        }
    });

    older.await.expect("older task");
    newer.await.expect("newer task");

    let applied = applied.lock().expect("applied lock");
    assert_eq!(applied.as_slice(), ["final prompt"]);
}
