//! Prompt construction for copy generation, detection and regeneration.
//!
//! Every piece of text sent to the model is built here so prompt regressions
//! can be caught by unit tests without a model in the loop.
//!
//! A generation request is made of two parts:
//!
//! * the **persona**, the system message that fixes audience, tone, product
//!   rules and the platform rules; built by [`persona`] from a
//!   [`ProductContext`] and reused verbatim for regeneration
//! * the **task**, the user message: what to produce from the attached
//!   material, followed by the [`response_shape_instruction`]
//!
//! The platform rules ([`instagram_rules`], [`linkedin_rules`]) are shared by
//! both persona strategies and must not be softened: in particular the LinkedIn
//! minimum of [`LINKEDIN_MIN_WORDS`] words is a hard constraint.
//!
//! All prompts are written in Brazilian Portuguese, the language of the
//! generated copy.

use crate::output::Platform;
use crate::product::{CatalogEntry, ProductCategory, ProductContext, ProductDescriptor, ProductMode};

/// Minimum length of a LinkedIn article, in words.
pub const LINKEDIN_MIN_WORDS: usize = 150;

/// Appended to every persona; the pipeline parses the reply as JSON.
const JSON_ONLY_RULE: &str = "=== FORMATO DE RESPOSTA ===\n\
Responda SEMPRE com um único objeto JSON sintaticamente válido, sem texto antes ou depois.";

/// Instagram rules. `brand_tag` and `product_tag` are hashtags the caption must carry.
pub fn instagram_rules(brand_tag: &str, product_tag: &str) -> String {
    format!(
        r#"1. INSTAGRAM (DESEJO & VISUAL):
   - Texto CURTO, guiado pelo visual e carregado de emoção.
   - OBRIGATÓRIO: a primeira linha é um hook visual (ex: "Parece ficção científica, mas é sua nova avaliação").
   - Estrutura AIDA: Atenção, Interesse, Desejo, Ação.
   - Use emojis estratégicos (💎, 🧬, 🚀) mas mantenha a classe.
   - Hashtags: inclua obrigatoriamente {brand_tag} e {product_tag}, mais hashtags relevantes do nicho."#
    )
}

/// LinkedIn rules, including the minimum word count and the mandatory structure.
pub fn linkedin_rules() -> String {
    format!(
        r#"2. LINKEDIN (AUTORIDADE & ROI):
   - MÍNIMO de {LINKEDIN_MIN_WORDS} palavras. Textos menores são inaceitáveis.
   - Estrutura OBRIGATÓRIA de artigo: Título → Problema de mercado → Solução técnica → Conclusão financeira (ROI).
   - PROIBIDO: textos curtos, genéricos ou com "cara de anúncio"; nada de frases de vendedor.
   - Use bullet points para dados técnicos.
   - Tom: sofisticado, especialista, provocativo."#
    )
}

fn platform_rules(brand_tag: &str, product_tag: &str) -> String {
    format!(
        "=== REGRAS DE PLATAFORMA ===\n\n{}\n\n{}",
        instagram_rules(brand_tag, product_tag),
        linkedin_rules()
    )
}

// ── Personas ─────────────────────────────────────────────────────────────

/// Build the persona (system message) for a product context.
///
/// A detected descriptor selects the dynamic template; otherwise the catalog
/// is consulted, either for the pinned category or, in `Auto`, for all of them
/// with an instruction to infer which applies.
pub fn persona(context: &ProductContext) -> String {
    match (&context.detected, context.mode) {
        (Some(descriptor), _) => dynamic_persona(descriptor),
        (None, ProductMode::Fixed(category)) => catalog_persona(category.entry()),
        (None, ProductMode::Auto) => catalog_inference_persona(),
    }
}

const CATALOG_ROLE: &str = r#"ATUE COMO: Diretor de Marketing Global da VISBODY e Consultor de Negócios Fitness/Médico.

SUA AUDIÊNCIA B2B (LinkedIn): Donos de grandes redes de academia, fisioterapeutas de elite e médicos nutrólogos. Eles odeiam "papinho de vendedor". Eles buscam dados, tecnologia e retorno financeiro.
SUA AUDIÊNCIA B2C/B2B (Instagram): Personal trainers e o público final que valoriza tecnologia de ponta e estética futurista."#;

fn catalog_rules_block(entry: &CatalogEntry) -> String {
    let examples = entry
        .gender_examples
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "PRODUTO: {name} (também chamado de: {aliases})\n\
         - GÊNERO (INEGOCIÁVEL): {gender} ({examples}).\n\
         - TÓPICOS PERMITIDOS: {allowed}.\n\
         - TÓPICOS PROIBIDOS: {forbidden}.\n\
         - HASHTAGS: {brand_tag} {product_tag}",
        name = entry.display_name,
        aliases = entry.aliases.join(", "),
        gender = entry.gender.label(),
        allowed = entry.allowed_topics.join("; "),
        forbidden = entry.forbidden_topics.join("; "),
        brand_tag = entry.brand_hashtag,
        product_tag = entry.product_hashtag,
    )
}

fn catalog_persona(entry: &CatalogEntry) -> String {
    format!(
        "{CATALOG_ROLE}\n\n=== REGRAS DO PRODUTO ===\n{}\n\n{}\n\n{JSON_ONLY_RULE}",
        catalog_rules_block(entry),
        platform_rules(entry.brand_hashtag, entry.product_hashtag),
    )
}

fn catalog_inference_persona() -> String {
    let entries = ProductCategory::ALL
        .iter()
        .map(|c| catalog_rules_block(c.entry()))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{CATALOG_ROLE}\n\n\
         === CATÁLOGO DE PRODUTOS ===\n\
         Identifique qual dos produtos abaixo aparece no material e aplique SOMENTE as regras dele.\n\n\
         {entries}\n\n{}\n\n{JSON_ONLY_RULE}",
        platform_rules("a hashtag da marca", "a hashtag do produto identificado"),
    )
}

fn dynamic_persona(d: &ProductDescriptor) -> String {
    format!(
        r#"ATUE COMO: Diretor de Marketing Global da {brand} e especialista no mercado de {category}.

PRODUTO: {name}
MARCA: {brand}
CATEGORIA: {category}
DIFERENCIAL PRINCIPAL: {differentiator}

SUA AUDIÊNCIA B2B (LinkedIn): decisores, compradores técnicos e investidores do mercado de {category}. Eles odeiam "papinho de vendedor". Eles buscam dados, tecnologia e retorno financeiro.
SUA AUDIÊNCIA (Instagram): o público final e os influenciadores que valorizam inovação e status.

Refira-se ao produto sempre como "{name}" e destaque o diferencial "{differentiator}" em todos os ângulos.

{rules}

{JSON_ONLY_RULE}"#,
        name = d.name,
        brand = d.brand,
        category = d.category,
        differentiator = d.differentiator,
        rules = platform_rules(&d.brand_hashtag(), &d.product_hashtag()),
    )
}

// ── Response shape & tasks ───────────────────────────────────────────────

/// The structured-output contract: one object holding `count` ordered angles.
pub fn response_shape_instruction(count: usize) -> String {
    format!(
        r#"Responda ESTRITAMENTE com este JSON (sem markdown em volta), contendo EXATAMENTE {count} itens em "contents":
{{
    "contents": [
        {{
            "angulo": "Nome do Ângulo (Ex: Foco em Retenção, Foco em Tecnologia 3D)",
            "instagram": "Texto...",
            "linkedin": "Texto..."
        }}
    ]
}}"#
    )
}

/// Task for a single product image.
pub fn image_task(count: usize) -> String {
    format!(
        r#"Analise esta imagem do produto com "olhar de raio-x".
Identifique: Design, Tecnologia visível, Interface, Ergonomia.

Crie {count} estratégias de conteúdo PREMIUM, cada uma com um ângulo distinto, por exemplo:
- Foco em Autoridade Técnica (para convencer o dono da clínica/academia).
- Foco em Experiência do Cliente (o "Efeito Uau" para o aluno).
- Foco em Diferenciação de Mercado (por que isso vence a concorrência).

{}"#,
        response_shape_instruction(count)
    )
}

/// Task for a document (text or scanned pages).
pub fn document_task(count: usize) -> String {
    format!(
        r#"Analise este documento técnico. Não quero resumo, quero ESTRATÉGIA.
Extraia {count} "Golden Nuggets" (Pontos de Ouro) deste material.

Para o LinkedIn: transforme cada ponto em uma lição de negócios/tecnologia robusta. Use dados, cite especificações como vantagens competitivas.
Para o Instagram: transforme cada ponto em desejo visual e status.

{}"#,
        response_shape_instruction(count)
    )
}

/// Document task with the extracted text inlined, capped at `limit` characters.
pub fn document_text_task(text: &str, limit: usize, count: usize) -> String {
    format!(
        "Material do produto:\n---\n{}\n---\n{}",
        truncate_chars(text, limit),
        document_task(count)
    )
}

// ── Regeneration ─────────────────────────────────────────────────────────

/// Platform-specific correction instruction for a rewrite.
pub fn regeneration_instruction(platform: Platform) -> String {
    match platform {
        Platform::Instagram => r#"CORREÇÃO PARA INSTAGRAM:
- O texto anterior estava morno. Quero algo MAGNÉTICO e CURTO.
- Abra com um hook visual na primeira linha.
- Use o modelo AIDA (Atenção, Interesse, Desejo, Ação).
- Enfatize a exclusividade e o design do produto.
- Faça o leitor sentir que está ficando para trás se não tiver isso.
- Mantenha as hashtags da marca e do produto."#
            .to_string(),
        Platform::Linkedin => format!(
            r#"CORREÇÃO PARA LINKEDIN (NÍVEL EXPERT):
- O texto anterior estava muito simples/comercial.
- Escreva como um CEO falando com outro CEO.
- MÍNIMO de {LINKEDIN_MIN_WORDS} palavras.
- Estrutura: Título → Problema de mercado → Solução técnica → Conclusão financeira (ROI).
- Traga dados, fale sobre dor de mercado (ex: rotatividade de alunos, imprecisão de avaliações antigas).
- Termine com uma pergunta reflexiva de negócios."#
        ),
    }
}

/// The rewrite request for one platform of one angle.
pub fn regeneration_task(platform: Platform, angle_label: &str) -> String {
    format!(
        "REESCREVER: {}\nContexto do Ângulo: \"{angle_label}\"\n\n{}\n\nRetorne APENAS JSON: {{ \"new_text\": \"...\" }}",
        platform.as_str().to_uppercase(),
        regeneration_instruction(platform),
    )
}

/// Rewrite request with the retained text context inlined, capped at `limit` characters.
pub fn regeneration_text_task(
    context: &str,
    limit: usize,
    platform: Platform,
    angle_label: &str,
) -> String {
    format!(
        "Contexto:\n---\n{}\n---\n{}",
        truncate_chars(context, limit),
        regeneration_task(platform, angle_label)
    )
}

// ── Detection ────────────────────────────────────────────────────────────

/// System message for the product detection call.
pub const DETECTION_PERSONA: &str = "Você é um analista de produtos. Identifique com precisão o produto apresentado no material. Responda somente com um objeto JSON válido.";

/// Detection instruction; the reply must be the four-field descriptor.
pub const DETECTION_INSTRUCTION: &str = r#"Identifique o produto principal deste material.
Retorne ESTRITAMENTE este JSON:
{"name": "...", "brand": "...", "category": "...", "differentiator": "..."}
- name: nome comercial ou modelo do produto
- brand: fabricante ou marca
- category: categoria do produto (ex: Esteira, Scanner Corporal, Smartphone)
- differentiator: principal diferencial competitivo, em poucas palavras"#;

/// Detection instruction with a text excerpt inlined, capped at `limit` characters.
pub fn detection_text_task(text: &str, limit: usize) -> String {
    format!(
        "Trecho do material:\n---\n{}\n---\n{DETECTION_INSTRUCTION}",
        truncate_chars(text, limit)
    )
}

/// Return at most `max_chars` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
