pub fn research_purpose(query: &str) -> String {
    format!(
        "Given the following user query:\n\n\
         \"{query}\"\n\n\
         Write the research purpose of a journal article in a single sentence that states the objective of the study.\n\
         - The research purpose must start with 'To'.\n\
         - The research purpose must be a single sentence, for example 'To investigate the efficacy of X compared to Y in treating Z.'\n\
         - If the query names specific conditions (study designs, treatments, patient populations), include them.\n\
         - Only rephrase the query as much as necessary.\n\
         - Enclose the research purpose in triple backticks. Do not include any other text."
    )
}

pub fn mesh_strategy(query: &str, research_purpose: &str) -> String {
    format!(
        "User Query: \"{query}\"\n\n\
         Research Purpose: \"{research_purpose}\"\n\n\
         Write a simple boolean search query for PubMed that captures as many relevant studies as possible:\n\
         - The search must not be restrictive.\n\
         - Never use compound words. Split them into simple words joined with 'AND' or 'OR'.\n\
         - Never capitalize words unnecessarily.\n\
         - Group synonyms and related terms in parentheses, separated by 'OR'.\n\
         - Combine different groups with 'AND'.\n\
         - Only use population, intervention, and outcome terms.\n\
         - Do not specify date ranges.\n\
         - Output ONLY the boolean search query in triple backticks. Do not include any other text."
    )
}
