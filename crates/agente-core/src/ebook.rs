//! The SPIN e-book shipped with the application.
//!
//! Chapters are static and compiled in; nothing here is ever mutated.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EbookChapter {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub image_url: Option<&'static str>,
}

pub const EBOOK_TITLE: &str = "O Código SPIN";
pub const EBOOK_SUBTITLE: &str = "Domine a ciência da influência.";
pub const CHAPTER_MISSION: &str =
    "Missão: Use o Agente Cirúrgico na aba ao lado para simular este cenário agora mesmo.";

static CHAPTERS: [EbookChapter; 6] = [
    EbookChapter {
        id: "1",
        title: "A Chave e a Responsabilidade",
        content: "Você está prestes a receber uma ferramenta de influência muito poderosa. Use-a com responsabilidade.\n\nEsta metodologia, se bem aplicada, permitirá que você crie uma imensa capacidade de influenciar pessoas. O meu alerta é simples: só venda aquilo que de fato funciona. Não use este conhecimento para enganar, persuadir ou manipular. Estou colocando muito poder em suas mãos.\n\nNa década de 80, Neil Rackham observou um problema: técnicas tradicionais falhavam em vendas complexas. Em vez de teorizar, ele acompanhou os vendedores de maior sucesso do mundo e descobriu que eles seguiam um padrão específico: SPIN (Situação, Problema, Implicação, Necessidade).",
        image_url: Some("https://images.unsplash.com/photo-1589829085413-56de8ae18c73?auto=format&fit=crop&q=80&w=1200"),
    },
    EbookChapter {
        id: "2",
        title: "A Caverna de Platão e o Cliente",
        content: "Para entender o SPIN, precisamos entrar na caverna de Platão. \"Para eles, o mundo era apenas sombra.\"\n\nImagine prisioneiros acorrentados vendo apenas sombras na parede. Para eles, aquilo é a única realidade. Seu cliente vive na própria caverna. A sua \"realidade\" não é a dele.\n\nQuando você simplesmente descreve seu produto, o cliente interpreta isso através das \"sombras\" da própria compreensão. O resultado é a objeção. O SPIN não descreve a saída da caverna. Ele faz perguntas que guiam o cliente até a luz.\n\nA magia está em não impor sua perspectiva, mas construir junto com o cliente uma nova compreensão sobre:\n1. A real dimensão do problema.\n2. A urgência da mudança.\n3. A visão do cenário ideal.",
        image_url: Some("https://images.unsplash.com/photo-1508349937151-22b68b72d5b1?auto=format&fit=crop&q=80&w=1200"),
    },
    EbookChapter {
        id: "3",
        title: "Situação (S) e Problema (P)",
        content: "A Investigação: Mapeando o terreno e encontrando a dor.\n\nPERGUNTAS DE SITUAÇÃO (S):\nObjetivo: Coletar dados e entender o contexto atual.\nExemplos: \"Há quanto tempo a empresa existe?\", \"Qual tecnologia vocês usam?\".\nATENÇÃO: Não gaste mais de 10 minutos aqui. Estas perguntas não agregam valor para o cliente.\n\nPERGUNTAS DE PROBLEMA (P):\nObjetivo: Fazer o cliente admitir e explorar suas dificuldades e insatisfações.\nExemplos: \"Por que você acha que o time não está performando?\", \"O que te impede de chegar onde gostaria?\".\nInsight: Ninguém gosta de admitir fraquezas, mas é necessário.",
        image_url: Some("https://images.unsplash.com/photo-1455390582262-044cdead277a?auto=format&fit=crop&q=80&w=1200"),
    },
    EbookChapter {
        id: "4",
        title: "Implicação (I) - O Iceberg",
        content: "O Problema gera desconforto. A Implicação gera a venda.\n\nImagine um iceberg. A ponta é o Problema. A parte submersa é a Implicação.\nSaber que existe um problema raramente é suficiente para motivar uma mudança complexa. O desconforto não basta. A mudança só acontece quando a pessoa é forçada a confrontar as consequências desse problema.\n\nObjetivo da Implicação (I): Explorar os efeitos e consequências, tornando a dor tangível e urgente.\nExemplo: \"Na sua viagem dos sonhos, você tirou fotos com vergonha do seu corpo?\" (Analogia do peso).",
        image_url: Some("https://images.unsplash.com/photo-1618331835717-801e976710b2?auto=format&fit=crop&q=80&w=1200"),
    },
    EbookChapter {
        id: "5",
        title: "Necessidade (N) - Neurociência",
        content: "Amplificando a dor e construindo o desejo.\n\nPERGUNTAS DE NECESSIDADE DE SOLUÇÃO (N):\nObjetivo: Mudar o foco da dor para o ganho. Fazer o cliente descrever o cenário ideal e os benefícios da solução.\nExemplos: \"Como seria sua empresa se todos batessem a meta?\", \"O que acontece se, no final do ano, você atingir seu objetivo?\".\n\nA NEUROCIÊNCIA:\nA teoria do Cérebro Trino (Reptiliano, Límbico, Neocórtex) nos mostra que decisões de compra acontecem nos cérebros Reptiliano e Límbico. Eles não entendem linguagem técnica. Eles entendem IMAGENS e EMOÇÕES.\n\nPare de descrever sua solução. Faça o cliente visualizar o resultado. Isso gera dopamina e endorfina, criando a empolgação necessária.",
        image_url: Some("https://images.unsplash.com/photo-1559757175-0eb30cd8c063?auto=format&fit=crop&q=80&w=1200"),
    },
    EbookChapter {
        id: "6",
        title: "A Mentalidade dos Mestres",
        content: "Existem duas grandes barreiras no SPIN:\n1. O Medo de Desafiar: Vendedor \"bonzinho\" não vende. Você precisa levar o cliente para a zona de desconforto.\n2. A Complexidade da Execução: Exige treino.\n\nA única maneira de se tornar mestre é através de simulação (Roleplay). A grandeza não nasce no conforto.\n\nINSPIRE-SE NOS MESTRES:\n- KOBE BRYANT: Não assistia apenas aos jogos. Assistia ao aquecimento, ao intervalo, buscando pontos de melhoria.\n- AYRTON SENNA: Era péssimo na chuva no início. Tornou-se lenda treinando incansavelmente na chuva, transformando fraqueza em força.\n\nEntenda: a grandeza tem que ser construída. Ela não é dada de presente. Você vai ter que batalhar para fazer isso.",
        image_url: Some("https://images.unsplash.com/photo-1517649763962-0c623066013b?auto=format&fit=crop&q=80&w=1200"),
    },
];

/// All chapters in reading order
pub fn chapters() -> &'static [EbookChapter] {
    &CHAPTERS
}

/// Look up a chapter by its id ("1".."6")
pub fn chapter(id: &str) -> Option<&'static EbookChapter> {
    CHAPTERS.iter().find(|c| c.id == id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapters_are_in_order_with_unique_ids() {
        let ids: Vec<&str> = chapters().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_chapter_lookup() {
        assert_eq!(chapter("4").map(|c| c.title), Some("Implicação (I) - O Iceberg"));
        assert_eq!(chapter(" 2 ").map(|c| c.id), Some("2"));
        assert!(chapter("7").is_none());
    }
}
