use hf_qa_http::{clean_text, QaClient, QueryRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let question = args
        .next()
        .unwrap_or_else(|| "What is the capital of France?".to_owned());
    let context = args.next().unwrap_or_else(|| {
        "France is a country in Western Europe. Its capital and largest city is Paris.".to_owned()
    });

    let request = QueryRequest::new(question, context);
    request.validate()?;

    let qa = QaClient::from_env();
    let result = qa.answer(request.question, request.context).await?;

    if result.ok {
        println!("Answer: {}", clean_text(&result.answer));
        println!("Confidence: {:.2}", result.score);
    } else {
        eprintln!(
            "Failed: {} (status {:?})",
            result.error.unwrap_or_default(),
            result.status_code
        );
    }

    Ok(())
}
